//! The reflow process state machine.
//!
//! [`tick`] is the whole control law: it takes the owned [`ProcessState`], the
//! current time, an optional fresh temperature sample and the operator's edge
//! commands, mutates the state, and returns the [`Actions`] the caller must
//! apply to the hardware. It performs no I/O and never blocks.
//!
//! Within one tick the order is fixed:
//! 1. incorporate the sample;
//! 2. operator commands (stop wins over everything that follows);
//! 3. sensor fault and stall evaluation;
//! 4. the current stage's transition rule;
//! 5. PID recomputation and heater drive.

use tracing::{debug, error, info, warn};

use crate::error::{FaultKind, SensorFault};
use crate::pid::GainStage;
use crate::profile::Profile;
use crate::state::{ProcessState, Stage};

/// Result of one sensor read, as delivered to the tick.
pub type Sample = Result<f32, SensorFault>;

/// Edge-triggered operator inputs for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commands {
    pub start_stop: bool,
    pub profile_toggle: bool,
    pub setpoint_up: bool,
    pub setpoint_down: bool,
}

impl Commands {
    pub const NONE: Self = Self {
        start_stop: false,
        profile_toggle: false,
        setpoint_up: false,
        setpoint_down: false,
    };
    pub const START_STOP: Self = Self {
        start_stop: true,
        ..Self::NONE
    };
    pub const PROFILE_TOGGLE: Self = Self {
        profile_toggle: true,
        ..Self::NONE
    };
    pub const SETPOINT_UP: Self = Self {
        setpoint_up: true,
        ..Self::NONE
    };
    pub const SETPOINT_DOWN: Self = Self {
        setpoint_down: true,
        ..Self::NONE
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub hz: u32,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Stage,
    pub to: Stage,
}

/// Requests produced by one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Actions {
    /// Heater command; applied every tick.
    pub heater_on: bool,
    /// PID output the heater command was derived from.
    pub output: f32,
    /// Fan change, only at stage entry/exit points.
    pub fan: Option<bool>,
    pub tones: Vec<Tone>,
    /// Profile to persist after a toggle.
    pub save_profile: Option<Profile>,
    /// Stage at the start of the tick and stage at its end, when they differ.
    pub transition: Option<Transition>,
    /// Set on the tick that entered Error.
    pub fault: Option<FaultKind>,
}

/// Advance the process by one scheduler tick.
pub fn tick(
    state: &mut ProcessState,
    now_ms: u64,
    sample: Option<Sample>,
    cmds: Commands,
) -> Actions {
    let entered = state.stage;
    let mut actions = Actions::default();

    let mut sensor_fault = None;
    let mut sampled = false;
    match sample {
        Some(Ok(t)) if t.is_finite() => {
            state.previous_reading = state.last_reading;
            state.last_reading = Some(t);
            sampled = true;
        }
        Some(Ok(t)) => sensor_fault = Some(SensorFault(format!("non-finite reading {t}"))),
        Some(Err(f)) => sensor_fault = Some(f),
        None => {}
    }

    let start = apply_commands(state, cmds, &mut actions);

    if let Some(fault) = sensor_fault {
        if state.stage != Stage::Error {
            warn!(%fault, "temperature sensor failed");
            enter_error(state, FaultKind::Sensor, &mut actions);
        }
    } else if sampled && state.running {
        check_stall(state, now_ms, &mut actions);
    }

    // Stop and faults have already decided this tick's stage.
    if state.stage == entered {
        step_stage(state, now_ms, start, &mut actions);
    }

    if let Some(reading) = state.last_reading {
        state.pid.compute(now_ms, state.setpoint, reading);
    }
    actions.output = state.pid.output();
    actions.heater_on = state.actuator.drive(now_ms, actions.output, state.running);

    if state.stage != entered {
        info!(from = %entered, to = %state.stage, setpoint = state.setpoint, "stage change");
        actions.transition = Some(Transition {
            from: entered,
            to: state.stage,
        });
    }
    actions
}

/// Returns whether a start was requested.
fn apply_commands(state: &mut ProcessState, cmds: Commands, actions: &mut Actions) -> bool {
    let mut start = false;
    if cmds.start_stop {
        if state.stage == Stage::Idle {
            start = true;
        } else {
            info!(stage = %state.stage, "operator stop");
            state.running = false;
            state.stage = Stage::Idle;
            state.fault = None;
        }
    }

    if cmds.profile_toggle {
        if state.stage == Stage::Idle {
            state.profile = state.profile.toggled();
            actions.save_profile = Some(state.profile);
            info!(profile = %state.profile, "profile selected");
        } else {
            debug!(stage = %state.stage, "profile toggle ignored outside idle");
        }
    }

    if state.running {
        if cmds.setpoint_up {
            state.setpoint += 1.0;
        }
        if cmds.setpoint_down {
            state.setpoint -= 1.0;
        }
        if cmds.setpoint_up || cmds.setpoint_down {
            debug!(setpoint = state.setpoint, "setpoint nudged");
        }
    }
    start
}

fn check_stall(state: &mut ProcessState, now_ms: u64, actions: &mut Actions) {
    let (Some(expected), Some(prev), Some(cur)) = (
        state.stage.expected_direction(),
        state.previous_reading,
        state.last_reading,
    ) else {
        return;
    };
    if state.stall.check(now_ms, expected, prev, cur) {
        error!(
            stage = %state.stage,
            reading = cur,
            since_ms = now_ms.saturating_sub(state.stall.last_change_ms()),
            "temperature stalled"
        );
        enter_error(state, FaultKind::Stall, actions);
    }
}

fn enter_error(state: &mut ProcessState, kind: FaultKind, actions: &mut Actions) {
    state.stage = Stage::Error;
    state.running = false;
    state.fault = Some(kind);
    state.fan_on = true;
    actions.fan = Some(true);
    actions.fault = Some(kind);
    actions.tones.push(pulse(state));
}

fn pulse(state: &ProcessState) -> Tone {
    Tone {
        hz: state.cfg.buzzer.tone_hz,
        duration_ms: state.cfg.buzzer.pulse_ms,
    }
}

/// Move to `next`. The stall window carries over: it is only re-armed when
/// a cycle starts and when the expected direction flips at the peak.
fn go(state: &mut ProcessState, next: Stage) {
    state.stage = next;
}

fn use_gains(state: &mut ProcessState, stage: GainStage) {
    state.gain_stage = stage;
    state.pid.set_gains(state.cfg.gains.get(stage));
}

fn step_stage(state: &mut ProcessState, now_ms: u64, start: bool, actions: &mut Actions) {
    match state.stage {
        Stage::Idle => idle(state, now_ms, start, actions),
        Stage::Preheat => preheat(state, now_ms),
        Stage::Soak => soak(state, now_ms),
        Stage::Reflow => reflow(state, now_ms),
        Stage::Cool => cool(state, now_ms, actions),
        Stage::Complete => complete(state, now_ms, actions),
        Stage::TooHot => too_hot(state, actions),
        Stage::Error => {
            state.fan_on = true;
            actions.fan = Some(true);
        }
    }
}

fn idle(state: &mut ProcessState, now_ms: u64, start: bool, actions: &mut Actions) {
    let Some(reading) = state.last_reading else {
        if start {
            warn!("start ignored: no temperature reading yet");
        }
        return;
    };
    if reading >= state.cfg.safety.room_temp_c {
        if start {
            warn!(reading, "start refused: plate is too hot");
        }
        go(state, Stage::TooHot);
        return;
    }
    if state.fan_on {
        state.fan_on = false;
        actions.fan = Some(false);
    }
    if start {
        begin_cycle(state, now_ms);
    }
}

fn begin_cycle(state: &mut ProcessState, now_ms: u64) {
    state.params = state.profile.params();
    state.setpoint = state.params.soak_temp_min;
    use_gains(state, GainStage::Preheat);
    state.pid.reset();
    state.actuator.reset(now_ms);
    state.run_started_ms = now_ms;
    state.descent_started = false;
    state.fault = None;
    state.running = true;
    state.stall.arm(now_ms);
    info!(profile = %state.profile, setpoint = state.setpoint, "cycle started");
    go(state, Stage::Preheat);
}

fn preheat(state: &mut ProcessState, now_ms: u64) {
    let Some(reading) = state.last_reading else {
        return;
    };
    if reading >= state.params.soak_temp_min {
        use_gains(state, GainStage::Soak);
        state.setpoint = state.params.soak_temp_min + state.cfg.soak_temp_step_c;
        state.soak_sub_deadline_ms = now_ms + state.params.soak_micro_period_ms;
        go(state, Stage::Soak);
    }
}

fn soak(state: &mut ProcessState, now_ms: u64) {
    if now_ms <= state.soak_sub_deadline_ms {
        return;
    }
    state.soak_sub_deadline_ms += state.params.soak_micro_period_ms;
    state.setpoint += state.cfg.soak_temp_step_c;
    debug!(setpoint = state.setpoint, "soak step");
    if state.setpoint > state.params.soak_temp_max {
        use_gains(state, GainStage::Reflow);
        state.setpoint = state.params.reflow_temp_max;
        go(state, Stage::Reflow);
    }
}

fn reflow(state: &mut ProcessState, now_ms: u64) {
    let Some(reading) = state.last_reading else {
        return;
    };
    let peak = state.params.reflow_temp_max;
    if !state.descent_started && reading >= peak - state.cfg.safety.reflow_early_cool_c {
        state.descent_started = true;
        state.setpoint = state.cfg.safety.cool_temp_min_c;
        info!(reading, setpoint = state.setpoint, "approaching peak, setpoint dropped");
    }
    if reading >= peak {
        // Rising until now; from here the plate must fall.
        state.stall.arm(now_ms);
        go(state, Stage::Cool);
    }
}

fn cool(state: &mut ProcessState, now_ms: u64, actions: &mut Actions) {
    let Some(reading) = state.last_reading else {
        return;
    };
    if reading <= state.cfg.safety.cool_temp_min_c {
        state.running = false;
        state.fan_on = true;
        actions.fan = Some(true);
        actions.tones.push(Tone {
            hz: state.cfg.buzzer.tone_hz,
            duration_ms: state.cfg.safety.complete_delay_ms,
        });
        state.complete_deadline_ms = now_ms + state.cfg.safety.complete_delay_ms;
        go(state, Stage::Complete);
    }
}

fn complete(state: &mut ProcessState, now_ms: u64, actions: &mut Actions) {
    if now_ms >= state.complete_deadline_ms {
        actions.tones.push(pulse(state));
        go(state, Stage::TooHot);
    }
}

fn too_hot(state: &mut ProcessState, actions: &mut Actions) {
    let Some(reading) = state.last_reading else {
        return;
    };
    if reading < state.cfg.safety.room_temp_c {
        state.fan_on = false;
        actions.fan = Some(false);
        go(state, Stage::Idle);
    }
}
