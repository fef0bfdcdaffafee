//! Positional PID with derivative-on-measurement and clamped integral.
//!
//! Gains are given per second; `ki` and `kd` are scaled by the nominal sample
//! time once per computation so the controller behaves the same whatever the
//! sample interval.

/// One set of controller gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    pub const PREHEAT: Self = Self {
        kp: 100.0,
        ki: 0.025,
        kd: 20.0,
    };
    pub const SOAK: Self = Self {
        kp: 300.0,
        ki: 0.05,
        kd: 250.0,
    };
    pub const REFLOW: Self = Self {
        kp: 300.0,
        ki: 0.05,
        kd: 350.0,
    };
}

/// Which gain set the current stage runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainStage {
    Preheat,
    Soak,
    Reflow,
}

/// The three named gain sets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSchedule {
    pub preheat: PidGains,
    pub soak: PidGains,
    pub reflow: PidGains,
}

impl Default for GainSchedule {
    fn default() -> Self {
        Self {
            preheat: PidGains::PREHEAT,
            soak: PidGains::SOAK,
            reflow: PidGains::REFLOW,
        }
    }
}

impl GainSchedule {
    pub const fn get(&self, stage: GainStage) -> PidGains {
        match stage {
            GainStage::Preheat => self.preheat,
            GainStage::Soak => self.soak,
            GainStage::Reflow => self.reflow,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    sample_ms: u64,
    out_max: f32,
    integral: f32,
    last_input: Option<f32>,
    last_time_ms: Option<u64>,
    output: f32,
}

impl PidController {
    /// Output is clamped to `[0, out_max]`.
    pub fn new(gains: PidGains, sample_ms: u64, out_max: f32) -> Self {
        Self {
            gains,
            sample_ms: sample_ms.max(1),
            out_max: out_max.max(0.0),
            integral: 0.0,
            last_input: None,
            last_time_ms: None,
            output: 0.0,
        }
    }

    /// Swap gains. Takes effect on the next computation; accumulated
    /// integral is kept.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Output of the most recent computation.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Forget history so the next `compute` runs immediately from a clean
    /// integral and without a derivative kick.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_input = None;
        self.last_time_ms = None;
        self.output = 0.0;
    }

    /// Recompute if at least one sample interval has passed since the last
    /// computation; otherwise return the previous output unchanged.
    pub fn compute(&mut self, now_ms: u64, setpoint: f32, input: f32) -> f32 {
        if let Some(t) = self.last_time_ms
            && now_ms.saturating_sub(t) < self.sample_ms
        {
            return self.output;
        }

        #[allow(clippy::cast_precision_loss)]
        let dt_s = self.sample_ms as f32 / 1000.0;
        let error = setpoint - input;
        let d_input = self.last_input.map_or(0.0, |prev| input - prev);

        // Anti-windup: the integral term is clamped to the output range.
        self.integral = (self.integral + self.gains.ki * dt_s * error).clamp(0.0, self.out_max);
        let raw = self.gains.kp * error + self.integral - (self.gains.kd / dt_s) * d_input;
        self.output = if raw.is_finite() {
            raw.clamp(0.0, self.out_max)
        } else {
            0.0
        };

        tracing::trace!(
            setpoint,
            input,
            error,
            integral = self.integral,
            output = self.output,
            "pid"
        );

        self.last_input = Some(input);
        self.last_time_ms = Some(now_ms);
        self.output
    }
}
