//! `From` implementations bridging `reflow_config` types to `reflow_core` types.

use crate::config::{BuzzerCfg, ControlCfg, PidCfg, SafetyCfg, TimingCfg};
use crate::pid::{GainSchedule, PidGains};
use crate::profile::Profile;

impl From<&reflow_config::Timing> for TimingCfg {
    fn from(c: &reflow_config::Timing) -> Self {
        Self {
            sample_interval_ms: c.sample_interval_ms,
            display_interval_ms: c.display_interval_ms,
            poll_ms: c.poll_ms,
        }
    }
}

impl From<&reflow_config::PidCfg> for PidCfg {
    fn from(c: &reflow_config::PidCfg) -> Self {
        Self {
            window_ms: c.window_ms,
            sample_ms: c.sample_ms,
        }
    }
}

impl From<&reflow_config::GainSet> for PidGains {
    fn from(c: &reflow_config::GainSet) -> Self {
        Self {
            kp: c.kp,
            ki: c.ki,
            kd: c.kd,
        }
    }
}

impl From<&reflow_config::Gains> for GainSchedule {
    fn from(c: &reflow_config::Gains) -> Self {
        Self {
            preheat: (&c.preheat).into(),
            soak: (&c.soak).into(),
            reflow: (&c.reflow).into(),
        }
    }
}

impl From<&reflow_config::Safety> for SafetyCfg {
    fn from(c: &reflow_config::Safety) -> Self {
        Self {
            stall_timeout_ms: c.stall_timeout_ms,
            room_temp_c: c.room_temp_c,
            cool_temp_min_c: c.cool_temp_min_c,
            reflow_early_cool_c: c.reflow_early_cool_c,
            complete_delay_ms: c.complete_delay_ms,
        }
    }
}

impl From<&reflow_config::Buzzer> for BuzzerCfg {
    fn from(c: &reflow_config::Buzzer) -> Self {
        Self {
            tone_hz: c.tone_hz,
            pulse_ms: c.pulse_ms,
        }
    }
}

impl From<&reflow_config::Config> for ControlCfg {
    fn from(c: &reflow_config::Config) -> Self {
        Self::new(
            (&c.pid).into(),
            (&c.gains).into(),
            (&c.safety).into(),
            (&c.buzzer).into(),
        )
    }
}

impl From<reflow_config::ProfileName> for Profile {
    fn from(p: reflow_config::ProfileName) -> Self {
        match p {
            reflow_config::ProfileName::LeadFree => Profile::LeadFree,
            reflow_config::ProfileName::Leaded => Profile::Leaded,
        }
    }
}
