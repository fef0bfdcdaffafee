//! Process stages and the owned mutable process state.

use crate::actuator::TimeWindowActuator;
use crate::config::ControlCfg;
use crate::error::FaultKind;
use crate::pid::{GainStage, PidController, PidGains};
use crate::profile::{Profile, ProfileParams};
use crate::stall::{Direction, StallMonitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Preheat,
    Soak,
    Reflow,
    Cool,
    Complete,
    TooHot,
    Error,
}

impl Stage {
    /// Direction the stall monitor expects while a cycle runs in this stage.
    /// `None` means no stall check applies.
    pub const fn expected_direction(self) -> Option<Direction> {
        match self {
            Stage::Idle | Stage::Preheat | Stage::Soak | Stage::Reflow => Some(Direction::Rising),
            Stage::Cool => Some(Direction::Falling),
            Stage::Complete | Stage::TooHot | Stage::Error => None,
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Preheat => "preheat",
            Stage::Soak => "soak",
            Stage::Reflow => "reflow",
            Stage::Cool => "cool",
            Stage::Complete => "complete",
            Stage::TooHot => "too-hot",
            Stage::Error => "error",
        };
        f.write_str(s)
    }
}

/// Read-only view handed to display sinks once per refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub stage: Stage,
    pub running: bool,
    /// `None` while no cycle runs.
    pub setpoint: Option<f32>,
    pub reading: Option<f32>,
    pub profile: Profile,
    pub fault: Option<FaultKind>,
    /// Seconds since the current cycle started.
    pub elapsed_s: u64,
}

/// Everything the tick mutates. Created once at startup and owned by the
/// caller; nothing else writes it.
#[derive(Debug, Clone)]
pub struct ProcessState {
    pub(crate) cfg: ControlCfg,
    pub(crate) stage: Stage,
    pub(crate) running: bool,
    pub(crate) setpoint: f32,
    pub(crate) profile: Profile,
    /// Active cycle parameters, latched from `profile` at start.
    pub(crate) params: ProfileParams,
    pub(crate) last_reading: Option<f32>,
    pub(crate) previous_reading: Option<f32>,
    pub(crate) soak_sub_deadline_ms: u64,
    pub(crate) complete_deadline_ms: u64,
    pub(crate) run_started_ms: u64,
    pub(crate) descent_started: bool,
    pub(crate) fan_on: bool,
    pub(crate) fault: Option<FaultKind>,
    pub(crate) gain_stage: GainStage,
    pub(crate) pid: PidController,
    pub(crate) actuator: TimeWindowActuator,
    pub(crate) stall: StallMonitor,
}

impl ProcessState {
    /// Idle, not running, with `profile` selected.
    pub fn new(cfg: ControlCfg, profile: Profile) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let out_max = cfg.pid.window_ms as f32;
        Self {
            pid: PidController::new(
                cfg.gains.get(GainStage::Preheat),
                cfg.pid.sample_ms,
                out_max,
            ),
            actuator: TimeWindowActuator::new(cfg.pid.window_ms),
            stall: StallMonitor::new(cfg.safety.stall_timeout_ms),
            cfg,
            stage: Stage::Idle,
            running: false,
            setpoint: 0.0,
            profile,
            params: profile.params(),
            last_reading: None,
            previous_reading: None,
            soak_sub_deadline_ms: 0,
            complete_deadline_ms: 0,
            run_started_ms: 0,
            descent_started: false,
            fan_on: false,
            fault: None,
            gain_stage: GainStage::Preheat,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Current target; only meaningful while `running()`.
    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Parameters of the cycle in progress (or of the selected profile when idle).
    pub fn params(&self) -> ProfileParams {
        if self.running {
            self.params
        } else {
            self.profile.params()
        }
    }

    pub fn last_reading(&self) -> Option<f32> {
        self.last_reading
    }

    pub fn previous_reading(&self) -> Option<f32> {
        self.previous_reading
    }

    pub fn last_change_ms(&self) -> u64 {
        self.stall.last_change_ms()
    }

    pub fn soak_sub_deadline_ms(&self) -> u64 {
        self.soak_sub_deadline_ms
    }

    pub fn window_start_ms(&self) -> u64 {
        self.actuator.window_start_ms()
    }

    pub fn fault(&self) -> Option<FaultKind> {
        self.fault
    }

    pub fn fan_on(&self) -> bool {
        self.fan_on
    }

    pub fn gain_stage(&self) -> GainStage {
        self.gain_stage
    }

    /// Gains the PID is currently running with.
    pub fn gains(&self) -> PidGains {
        self.pid.gains()
    }

    /// Output of the most recent PID computation, in ms of heater-on per window.
    pub fn output(&self) -> f32 {
        self.pid.output()
    }

    pub fn config(&self) -> &ControlCfg {
        &self.cfg
    }

    /// Whole seconds since the current cycle started; 0 when idle.
    pub fn elapsed_s(&self, now_ms: u64) -> u64 {
        if self.running {
            now_ms.saturating_sub(self.run_started_ms) / 1000
        } else {
            0
        }
    }

    pub fn snapshot(&self, now_ms: u64) -> Snapshot {
        Snapshot {
            stage: self.stage,
            running: self.running,
            setpoint: self.running.then_some(self.setpoint),
            reading: self.last_reading,
            profile: self.profile,
            fault: self.fault,
            elapsed_s: self.elapsed_s(now_ms),
        }
    }
}
