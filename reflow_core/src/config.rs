//! Configuration types for the reflow controller.
//!
//! These are the runtime configuration structs used by `ProcessState` and
//! `Station`. They are separate from the TOML-deserialized config in
//! `reflow_config`.

use crate::pid::GainSchedule;

/// Scheduler cadence.
#[derive(Debug, Clone, Copy)]
pub struct TimingCfg {
    /// Temperature sampling interval (ms).
    pub sample_interval_ms: u64,
    /// Display refresh interval (ms).
    pub display_interval_ms: u64,
    /// Sleep between scheduler ticks (ms).
    pub poll_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            display_interval_ms: 100,
            poll_ms: 10,
        }
    }
}

/// PID cadence and output range.
#[derive(Debug, Clone, Copy)]
pub struct PidCfg {
    /// Time-proportioning window (ms). Upper clamp of the PID output.
    pub window_ms: u64,
    /// Minimum interval between PID recomputations (ms).
    pub sample_ms: u64,
}

impl Default for PidCfg {
    fn default() -> Self {
        Self {
            window_ms: 2000,
            sample_ms: 1000,
        }
    }
}

/// Thresholds shared by every profile.
#[derive(Debug, Clone, Copy)]
pub struct SafetyCfg {
    pub stall_timeout_ms: u64,
    /// A cycle may only start below this temperature (°C).
    pub room_temp_c: f32,
    /// Cool stage completes at or below this temperature (°C).
    pub cool_temp_min_c: f32,
    /// Distance below the reflow peak at which the setpoint drops (°C).
    pub reflow_early_cool_c: f32,
    /// Delay from Complete to the final chime (ms).
    pub complete_delay_ms: u64,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self {
            stall_timeout_ms: 5000,
            room_temp_c: 50.0,
            cool_temp_min_c: 100.0,
            reflow_early_cool_c: 10.0,
            complete_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuzzerCfg {
    pub tone_hz: u32,
    /// Length of a short pulse (ms).
    pub pulse_ms: u64,
}

impl Default for BuzzerCfg {
    fn default() -> Self {
        Self {
            tone_hz: 1800,
            pulse_ms: 200,
        }
    }
}

/// Everything the pure tick needs besides the process state itself.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    pub pid: PidCfg,
    pub gains: GainSchedule,
    pub safety: SafetyCfg,
    pub buzzer: BuzzerCfg,
    /// Soak micro-step size (°C).
    pub soak_temp_step_c: f32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self::new(
            PidCfg::default(),
            GainSchedule::default(),
            SafetyCfg::default(),
            BuzzerCfg::default(),
        )
    }
}

impl ControlCfg {
    pub const SOAK_TEMP_STEP_C: f32 = 5.0;

    pub fn new(pid: PidCfg, gains: GainSchedule, safety: SafetyCfg, buzzer: BuzzerCfg) -> Self {
        Self {
            pid,
            gains,
            safety,
            buzzer,
            soak_temp_step_c: Self::SOAK_TEMP_STEP_C,
        }
    }

    /// Check the invariants the tick relies on.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pid.window_ms == 0 {
            return Err("pid window must be >= 1 ms");
        }
        if self.pid.sample_ms == 0 {
            return Err("pid sample interval must be >= 1 ms");
        }
        if !(self.soak_temp_step_c.is_finite() && self.soak_temp_step_c > 0.0) {
            return Err("soak step must be > 0");
        }
        if self.safety.room_temp_c >= self.safety.cool_temp_min_c {
            return Err("room temperature must be below the cool-down target");
        }
        if !(self.safety.reflow_early_cool_c.is_finite() && self.safety.reflow_early_cool_c >= 0.0) {
            return Err("early cool offset must be >= 0");
        }
        Ok(())
    }
}
