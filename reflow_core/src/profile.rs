//! Built-in reflow profiles.
//!
//! Each profile fixes the soak band, the reflow peak and the interval between
//! soak micro-steps. The table is static; the operator only chooses which row
//! is active.

/// Selectable solder alloy profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Lead-free (SAC305 class) alloys.
    #[default]
    LeadFree,
    /// Tin-lead (Sn63/Pb37 class) alloys.
    Leaded,
}

/// Temperatures in °C, period in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileParams {
    pub soak_temp_min: f32,
    pub soak_temp_max: f32,
    pub reflow_temp_max: f32,
    pub soak_micro_period_ms: u64,
}

const LEAD_FREE: ProfileParams = ProfileParams {
    soak_temp_min: 150.0,
    soak_temp_max: 200.0,
    reflow_temp_max: 250.0,
    soak_micro_period_ms: 9000,
};

const LEADED: ProfileParams = ProfileParams {
    soak_temp_min: 150.0,
    soak_temp_max: 180.0,
    reflow_temp_max: 224.0,
    soak_micro_period_ms: 10000,
};

impl Profile {
    /// Pure lookup into the profile table.
    pub const fn params(self) -> ProfileParams {
        match self {
            Profile::LeadFree => LEAD_FREE,
            Profile::Leaded => LEADED,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Profile::LeadFree => Profile::Leaded,
            Profile::Leaded => Profile::LeadFree,
        }
    }

    /// Encoding used by the one-byte profile store.
    pub const fn to_byte(self) -> u8 {
        match self {
            Profile::LeadFree => 0,
            Profile::Leaded => 1,
        }
    }

    /// `None` for any byte that is not a known profile.
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Profile::LeadFree),
            1 => Some(Profile::Leaded),
            _ => None,
        }
    }

    /// Two-letter tag shown on the display.
    pub const fn short_label(self) -> &'static str {
        match self {
            Profile::LeadFree => "LF",
            Profile::Leaded => "PB",
        }
    }
}

impl core::fmt::Display for Profile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Profile::LeadFree => f.write_str("lead-free"),
            Profile::Leaded => f.write_str("leaded"),
        }
    }
}
