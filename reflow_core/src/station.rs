//! Host-side scheduler around the pure state machine.
//!
//! `Station` owns the I/O collaborators and a `Clock`. Each `poll` gates the
//! periodic work (display refresh, temperature sampling) on elapsed time,
//! calls [`machine::tick`], and applies the resulting [`Actions`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use reflow_traits::{Clock, Heater, Indicators, ProfileStore, TempSensor};

use crate::config::TimingCfg;
use crate::error::{Result, SensorFault};
use crate::hw_error::map_hw_error;
use crate::machine::{self, Actions, Commands, Sample, Tone};
use crate::state::{ProcessState, Snapshot};
use crate::util::is_due;

/// Receives a snapshot once per display refresh. Purely observational.
pub trait DisplaySink {
    fn show(&mut self, snapshot: &Snapshot);
}

/// What one scheduler tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub now_ms: u64,
    /// Present on sampling ticks.
    pub sample: Option<Sample>,
    pub actions: Actions,
}

pub struct Station {
    pub(crate) sensor: Box<dyn TempSensor>,
    pub(crate) heater: Box<dyn Heater>,
    pub(crate) indicators: Box<dyn Indicators>,
    pub(crate) store: Box<dyn ProfileStore>,
    pub(crate) display: Box<dyn DisplaySink>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) timing: TimingCfg,
    pub(crate) state: ProcessState,
    pub(crate) last_sample_ms: Option<u64>,
    pub(crate) last_display_ms: Option<u64>,
}

impl core::fmt::Debug for Station {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Station")
            .field("stage", &self.state.stage())
            .field("running", &self.state.running())
            .field("profile", &self.state.profile())
            .field("last_reading", &self.state.last_reading())
            .finish_non_exhaustive()
    }
}

impl Station {
    /// Start building a Station.
    pub fn builder() -> crate::builder::StationBuilder<crate::builder::Missing, crate::builder::Missing>
    {
        crate::builder::StationBuilder::default()
    }

    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    pub fn timing(&self) -> TimingCfg {
        self.timing
    }

    /// Milliseconds since the station was built.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Sleep one poll period on the station's clock.
    pub fn idle_wait(&self) {
        self.clock.sleep(Duration::from_millis(self.timing.poll_ms));
    }

    /// Power-on sequence: two short chimes, then one sensor read.
    ///
    /// That read counts as the first sample; an unreadable sensor puts the
    /// process straight into Error.
    pub fn startup(&mut self) -> Result<TickReport> {
        let chime = Tone {
            hz: self.state.config().buzzer.tone_hz,
            duration_ms: self.state.config().buzzer.pulse_ms,
        };
        self.sound(chime);
        self.sound(chime);

        let now_ms = self.now_ms();
        let sample = self.read_sensor();
        if let Err(fault) = &sample {
            tracing::error!(%fault, "sensor unreadable at startup");
        }
        self.last_sample_ms = Some(now_ms);
        let actions = machine::tick(&mut self.state, now_ms, Some(sample.clone()), Commands::NONE);
        self.apply(&actions)?;
        Ok(TickReport {
            now_ms,
            sample: Some(sample),
            actions,
        })
    }

    /// One scheduler tick.
    pub fn poll(&mut self, cmds: Commands) -> Result<TickReport> {
        let now_ms = self.now_ms();

        if is_due(now_ms, self.last_display_ms, self.timing.display_interval_ms) {
            self.last_display_ms = Some(now_ms);
            self.display.show(&self.state.snapshot(now_ms));
        }

        let sample = if is_due(now_ms, self.last_sample_ms, self.timing.sample_interval_ms) {
            self.last_sample_ms = Some(now_ms);
            Some(self.read_sensor())
        } else {
            None
        };

        let actions = machine::tick(&mut self.state, now_ms, sample.clone(), cmds);
        if let Some(Ok(t)) = &sample
            && self.state.running()
        {
            tracing::debug!(
                t_s = self.state.elapsed_s(now_ms),
                setpoint = self.state.setpoint(),
                temperature = *t,
                output = actions.output,
                "sample"
            );
        }
        self.apply(&actions)?;
        Ok(TickReport {
            now_ms,
            sample,
            actions,
        })
    }

    /// Best-effort: command the heater off. Used on shutdown paths.
    pub fn heater_off(&mut self) -> Result<()> {
        self.heater
            .set(false)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("heater off")
    }

    fn read_sensor(&mut self) -> Sample {
        match self.sensor.read() {
            Ok(t) if t.is_finite() => Ok(t),
            Ok(t) => Err(SensorFault(format!("non-finite reading {t}"))),
            Err(e) => Err(SensorFault(map_hw_error(&*e).to_string())),
        }
    }

    fn apply(&mut self, actions: &Actions) -> Result<()> {
        self.heater
            .set(actions.heater_on)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("heater")?;

        if let Some(on) = actions.fan
            && let Err(e) = self.indicators.set_fan(on)
        {
            tracing::warn!(error = %e, on, "fan command failed");
        }
        for tone in &actions.tones {
            self.sound(*tone);
        }
        if let Some(profile) = actions.save_profile
            && let Err(e) = self.store.save(profile.to_byte())
        {
            tracing::warn!(error = %e, %profile, "failed to persist profile selection");
        }
        Ok(())
    }

    fn sound(&mut self, tone: Tone) {
        if let Err(e) = self
            .indicators
            .sound(tone.hz, Duration::from_millis(tone.duration_ms))
        {
            tracing::warn!(error = %e, "buzzer command failed");
        }
    }
}
