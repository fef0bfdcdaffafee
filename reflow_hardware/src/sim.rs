//! Simulated hotplate.
//!
//! Two lumped thermal masses: the heating element, driven by the relay, and
//! the plate the thermocouple is bonded to. Heat flows element → plate → room,
//! with extra plate loss while the fan runs. The element's stored heat makes
//! the plate keep rising for a while after the relay opens, which is what the
//! early setpoint drop in the reflow stage relies on.
//!
//! Time comes from the injected `Clock`, so a `ManualClock` runs a whole
//! cycle in milliseconds of wall time.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reflow_traits::{Clock, Heater, Indicators, TempSensor};

use crate::error::HwError;

/// Euler integration step (ms).
const STEP_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateParams {
    pub ambient_c: f32,
    pub start_c: f32,
    /// Element heating rate with the relay closed (°C/s).
    pub heater_c_per_s: f32,
    /// Element → plate coupling (1/s).
    pub coupling_per_s: f32,
    /// Plate → room loss (1/s).
    pub loss_per_s: f32,
    /// Extra plate loss with the fan on (1/s).
    pub fan_loss_per_s: f32,
}

impl Default for PlateParams {
    fn default() -> Self {
        Self {
            ambient_c: 25.0,
            start_c: 25.0,
            heater_c_per_s: 5.0,
            coupling_per_s: 0.08,
            loss_per_s: 0.003,
            fan_loss_per_s: 0.01,
        }
    }
}

/// Injected sensor failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimFaults {
    /// Every read reports an open thermocouple.
    pub open_sensor: bool,
    /// Reported temperature freezes after this many simulated seconds.
    pub stuck_after_s: Option<u64>,
}

#[derive(Debug)]
struct Plate {
    params: PlateParams,
    faults: SimFaults,
    element_c: f32,
    plate_c: f32,
    heater_on: bool,
    fan_on: bool,
    elapsed_ms: u64,
    stuck_at: Option<f32>,
}

impl Plate {
    fn advance_to(&mut self, now_ms: u64) {
        let p = self.params;
        while self.elapsed_ms < now_ms {
            let step = (now_ms - self.elapsed_ms).min(STEP_MS);
            #[allow(clippy::cast_precision_loss)]
            let dt = step as f32 / 1000.0;
            let heat = if self.heater_on { p.heater_c_per_s } else { 0.0 };
            let flow = p.coupling_per_s * (self.element_c - self.plate_c);
            let loss_rate = p.loss_per_s + if self.fan_on { p.fan_loss_per_s } else { 0.0 };
            self.element_c += (heat - flow) * dt;
            self.plate_c += (flow - loss_rate * (self.plate_c - p.ambient_c)) * dt;
            self.elapsed_ms += step;
        }
    }

    fn reported(&mut self) -> Result<f32, HwError> {
        if self.faults.open_sensor {
            return Err(HwError::OpenCircuit);
        }
        if let Some(after_s) = self.faults.stuck_after_s
            && self.elapsed_ms >= after_s.saturating_mul(1000)
        {
            return Ok(*self.stuck_at.get_or_insert(self.plate_c));
        }
        Ok(self.plate_c)
    }
}

#[derive(Clone)]
struct Shared {
    plate: Rc<RefCell<Plate>>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
}

impl Shared {
    fn with_plate<R>(&self, f: impl FnOnce(&mut Plate) -> R) -> R {
        let now = self.clock.ms_since(self.epoch);
        let mut plate = self.plate.borrow_mut();
        plate.advance_to(now);
        f(&mut plate)
    }
}

/// Owns the simulated plate and hands out its I/O endpoints.
#[derive(Clone)]
pub struct SimPlate {
    shared: Shared,
}

impl SimPlate {
    pub fn new(params: PlateParams, faults: SimFaults, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        tracing::debug!(?params, ?faults, "simulated hotplate");
        Self {
            shared: Shared {
                plate: Rc::new(RefCell::new(Plate {
                    params,
                    faults,
                    element_c: params.start_c,
                    plate_c: params.start_c,
                    heater_on: false,
                    fan_on: false,
                    elapsed_ms: 0,
                    stuck_at: None,
                })),
                clock,
                epoch,
            },
        }
    }

    pub fn sensor(&self) -> SimSensor {
        SimSensor {
            shared: self.shared.clone(),
        }
    }

    pub fn heater(&self) -> SimHeater {
        SimHeater {
            shared: self.shared.clone(),
        }
    }

    pub fn indicators(&self) -> SimIndicators {
        SimIndicators {
            shared: self.shared.clone(),
        }
    }

    /// True plate temperature now, ignoring injected sensor faults.
    pub fn temperature(&self) -> f32 {
        self.shared.with_plate(|p| p.plate_c)
    }

    pub fn heater_on(&self) -> bool {
        self.shared.with_plate(|p| p.heater_on)
    }

    pub fn fan_on(&self) -> bool {
        self.shared.with_plate(|p| p.fan_on)
    }
}

pub struct SimSensor {
    shared: Shared,
}

impl TempSensor for SimSensor {
    fn read(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.shared.with_plate(Plate::reported)?)
    }
}

pub struct SimHeater {
    shared: Shared,
}

impl Heater for SimHeater {
    fn set(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.shared.with_plate(|p| {
            if p.heater_on != on {
                tracing::trace!(on, plate_c = p.plate_c, "relay");
            }
            p.heater_on = on;
        });
        Ok(())
    }
}

/// Fan drives the plate model; the buzzer only logs.
pub struct SimIndicators {
    shared: Shared,
}

impl Indicators for SimIndicators {
    fn set_fan(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.shared.with_plate(|p| {
            if p.fan_on != on {
                tracing::info!(on, plate_c = p.plate_c, "fan");
            }
            p.fan_on = on;
        });
        Ok(())
    }

    fn sound(
        &mut self,
        tone_hz: u32,
        duration: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(tone_hz, duration_ms = duration.as_millis() as u64, "buzzer");
        Ok(())
    }
}
