//! Type-state builder for `Station`.
//!
//! The builder enforces at compile time that a sensor and a heater are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use reflow_traits::{Clock, Heater, Indicators, MonotonicClock, ProfileStore, TempSensor};

use crate::config::{ControlCfg, TimingCfg};
use crate::error::{BuildError, Result};
use crate::mocks::{NullDisplay, NullIndicators, VolatileStore};
use crate::profile::Profile;
use crate::state::ProcessState;
use crate::station::{DisplaySink, Station};

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Station`. All fields are validated on `build()`.
pub struct StationBuilder<S, H> {
    sensor: Option<Box<dyn TempSensor>>,
    heater: Option<Box<dyn Heater>>,
    indicators: Option<Box<dyn Indicators>>,
    store: Option<Box<dyn ProfileStore>>,
    display: Option<Box<dyn DisplaySink>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    control: Option<ControlCfg>,
    timing: Option<TimingCfg>,
    default_profile: Profile,
    _s: PhantomData<S>,
    _h: PhantomData<H>,
}

impl Default for StationBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            heater: None,
            indicators: None,
            store: None,
            display: None,
            clock: None,
            control: None,
            timing: None,
            default_profile: Profile::default(),
            _s: PhantomData,
            _h: PhantomData,
        }
    }
}

impl<S, H> StationBuilder<S, H> {
    fn retype<S2, H2>(self) -> StationBuilder<S2, H2> {
        StationBuilder {
            sensor: self.sensor,
            heater: self.heater,
            indicators: self.indicators,
            store: self.store,
            display: self.display,
            clock: self.clock,
            control: self.control,
            timing: self.timing,
            default_profile: self.default_profile,
            _s: PhantomData,
            _h: PhantomData,
        }
    }

    /// Fan and buzzer. Defaults to a sink that discards every command.
    pub fn with_indicators(mut self, indicators: impl Indicators + 'static) -> Self {
        self.indicators = Some(Box::new(indicators));
        self
    }

    /// Persisted profile selection. Defaults to an in-memory slot.
    pub fn with_store(mut self, store: impl ProfileStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_display(mut self, display: impl DisplaySink + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    /// Inject a custom clock (tests, simulation).
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Profile used when the store is empty or holds an unknown value.
    pub fn with_default_profile(mut self, profile: Profile) -> Self {
        self.default_profile = profile;
        self
    }

    /// Apply every control-relevant section of a loaded config file.
    pub fn apply_config(self, cfg: &reflow_config::Config) -> Self {
        self.with_control(ControlCfg::from(cfg))
            .with_timing(TimingCfg::from(&cfg.timing))
            .with_default_profile(cfg.profile.default.into())
    }

    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Station> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let heater = self
            .heater
            .ok_or_else(|| eyre::Report::new(BuildError::MissingHeater))?;

        let control = self.control.unwrap_or_default();
        control
            .validate()
            .map_err(|msg| eyre::Report::new(BuildError::InvalidConfig(msg)))?;
        let timing = self.timing.unwrap_or_default();
        if timing.sample_interval_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sample interval must be >= 1 ms",
            )));
        }
        if timing.display_interval_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "display interval must be >= 1 ms",
            )));
        }
        if control.safety.stall_timeout_ms < timing.sample_interval_ms {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "stall timeout must span at least one sample interval",
            )));
        }

        let mut store: Box<dyn ProfileStore> = match self.store {
            Some(s) => s,
            None => Box::new(VolatileStore::default()),
        };
        let profile = load_profile(store.as_mut(), self.default_profile);

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();

        Ok(Station {
            sensor,
            heater,
            indicators: self.indicators.unwrap_or_else(|| Box::new(NullIndicators)),
            store,
            display: self.display.unwrap_or_else(|| Box::new(NullDisplay)),
            clock,
            epoch,
            timing,
            state: ProcessState::new(control, profile),
            last_sample_ms: None,
            last_display_ms: None,
        })
    }
}

impl<H> StationBuilder<Missing, H> {
    pub fn with_sensor(mut self, sensor: impl TempSensor + 'static) -> StationBuilder<Set, H> {
        self.sensor = Some(Box::new(sensor));
        self.retype()
    }
}

impl<S> StationBuilder<S, Missing> {
    pub fn with_heater(mut self, heater: impl Heater + 'static) -> StationBuilder<S, Set> {
        self.heater = Some(Box::new(heater));
        self.retype()
    }
}

impl StationBuilder<Set, Set> {
    /// Build a validated `Station`.
    pub fn build(self) -> Result<Station> {
        self.try_build()
    }
}

/// Read the persisted selection. Unknown or missing values fall back to
/// `default`, which is written back so the store is valid afterwards.
fn load_profile(store: &mut dyn ProfileStore, default: Profile) -> Profile {
    match store.load() {
        Ok(Some(byte)) => {
            if let Some(p) = Profile::from_byte(byte) {
                tracing::debug!(profile = %p, "profile restored");
                return p;
            }
            tracing::warn!(byte, "unknown profile byte in store; resetting");
        }
        Ok(None) => tracing::debug!("profile store empty"),
        Err(e) => tracing::warn!(error = %e, "profile store unreadable; using default"),
    }
    if let Err(e) = store.save(default.to_byte()) {
        tracing::warn!(error = %e, "failed to reset profile store");
    }
    default
}
