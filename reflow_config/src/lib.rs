#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the reflow controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; defaults reproduce the stock hotplate tuning.
use serde::Deserialize;
use serde::de::Deserializer;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileName {
    #[default]
    LeadFree,
    Leaded,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Temperature sampling interval (ms).
    pub sample_interval_ms: u64,
    /// Display refresh interval (ms).
    pub display_interval_ms: u64,
    /// Scheduler poll period (ms); one tick per poll.
    pub poll_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            display_interval_ms: 100,
            poll_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PidCfg {
    /// Time-proportioning window (ms); also the upper output clamp.
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

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GainSet {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Gains {
    /// Accepts either a table `{ kp = 100.0, ki = 0.025, kd = 20.0 }`
    /// or a triple `[100.0, 0.025, 20.0]`.
    #[serde(deserialize_with = "de_gain_set")]
    pub preheat: GainSet,
    #[serde(deserialize_with = "de_gain_set")]
    pub soak: GainSet,
    #[serde(deserialize_with = "de_gain_set")]
    pub reflow: GainSet,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            preheat: GainSet {
                kp: 100.0,
                ki: 0.025,
                kd: 20.0,
            },
            soak: GainSet {
                kp: 300.0,
                ki: 0.05,
                kd: 250.0,
            },
            reflow: GainSet {
                kp: 300.0,
                ki: 0.05,
                kd: 350.0,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GainToml {
    Triple((f32, f32, f32)),
    Table { kp: f32, ki: f32, kd: f32 },
}

fn de_gain_set<'de, D>(deserializer: D) -> Result<GainSet, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match GainToml::deserialize(deserializer)? {
        GainToml::Triple((kp, ki, kd)) | GainToml::Table { kp, ki, kd } => GainSet { kp, ki, kd },
    })
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Safety {
    /// Fault if temperature does not move as expected for longer than this (ms).
    pub stall_timeout_ms: u64,
    /// Plate must be below this to start a cycle (°C).
    pub room_temp_c: f32,
    /// Cool stage ends at or below this (°C).
    pub cool_temp_min_c: f32,
    /// Setpoint drops to `cool_temp_min_c` this far below the reflow peak (°C).
    pub reflow_early_cool_c: f32,
    /// Delay between completion and the final chime (ms).
    pub complete_delay_ms: u64,
}

impl Default for Safety {
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ProfileCfg {
    /// Profile used when the store is empty or unreadable.
    pub default: ProfileName,
    /// Path of the one-byte profile store. In-memory when absent.
    pub store: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Buzzer {
    pub tone_hz: u32,
    pub pulse_ms: u64,
}

impl Default for Buzzer {
    fn default() -> Self {
        Self {
            tone_hz: 1800,
            pulse_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Simulation {
    /// Ambient temperature the plate relaxes to (°C).
    pub ambient_c: f32,
    /// Plate temperature at power-on (°C). Defaults to ambient.
    pub start_c: Option<f32>,
    /// Element heating rate with the relay closed (°C/s).
    pub heater_c_per_s: f32,
    /// Element → plate coupling (1/s).
    pub coupling_per_s: f32,
    /// Plate → ambient loss (1/s).
    pub loss_per_s: f32,
    /// Extra plate loss while the fan runs (1/s).
    pub fan_loss_per_s: f32,
    /// Report an open thermocouple on every read.
    pub open_sensor: bool,
    /// Freeze the reported temperature after this many simulated seconds.
    pub stuck_after_s: Option<u64>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            ambient_c: 25.0,
            start_c: None,
            heater_c_per_s: 5.0,
            coupling_per_s: 0.08,
            loss_per_s: 0.003,
            fan_loss_per_s: 0.01,
            open_sensor: false,
            stuck_after_s: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub timing: Timing,
    pub pid: PidCfg,
    pub gains: Gains,
    pub safety: Safety,
    pub profile: ProfileCfg,
    pub buzzer: Buzzer,
    pub logging: Logging,
    pub simulation: Simulation,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn check_gains(name: &str, g: &GainSet) -> eyre::Result<()> {
    for (field, v) in [("kp", g.kp), ("ki", g.ki), ("kd", g.kd)] {
        if !v.is_finite() || v < 0.0 {
            eyre::bail!("gains.{name}.{field} must be finite and >= 0");
        }
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Timing
        if self.timing.sample_interval_ms == 0 {
            eyre::bail!("timing.sample_interval_ms must be >= 1");
        }
        if self.timing.display_interval_ms == 0 {
            eyre::bail!("timing.display_interval_ms must be >= 1");
        }
        if self.timing.poll_ms == 0 {
            eyre::bail!("timing.poll_ms must be >= 1");
        }
        if self.timing.poll_ms > self.timing.sample_interval_ms {
            eyre::bail!("timing.poll_ms must not exceed timing.sample_interval_ms");
        }

        // PID
        if self.pid.window_ms == 0 {
            eyre::bail!("pid.window_ms must be >= 1");
        }
        if self.pid.sample_ms == 0 {
            eyre::bail!("pid.sample_ms must be >= 1");
        }
        check_gains("preheat", &self.gains.preheat)?;
        check_gains("soak", &self.gains.soak)?;
        check_gains("reflow", &self.gains.reflow)?;

        // Safety
        if self.safety.stall_timeout_ms < self.timing.sample_interval_ms {
            eyre::bail!("safety.stall_timeout_ms must be >= timing.sample_interval_ms");
        }
        if self.safety.stall_timeout_ms > 10 * 60 * 1000 {
            eyre::bail!("safety.stall_timeout_ms is unreasonably large (>10min)");
        }
        if !self.safety.room_temp_c.is_finite() || !self.safety.cool_temp_min_c.is_finite() {
            eyre::bail!("safety temperatures must be finite");
        }
        if self.safety.room_temp_c >= self.safety.cool_temp_min_c {
            eyre::bail!("safety.room_temp_c must be below safety.cool_temp_min_c");
        }
        if !(0.0..=50.0).contains(&self.safety.reflow_early_cool_c) {
            eyre::bail!("safety.reflow_early_cool_c must be in [0.0, 50.0]");
        }

        // Buzzer
        if self.buzzer.tone_hz == 0 {
            eyre::bail!("buzzer.tone_hz must be > 0");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Simulation
        let sim = &self.simulation;
        for (field, v) in [
            ("heater_c_per_s", sim.heater_c_per_s),
            ("coupling_per_s", sim.coupling_per_s),
            ("loss_per_s", sim.loss_per_s),
            ("fan_loss_per_s", sim.fan_loss_per_s),
        ] {
            if !v.is_finite() || v < 0.0 {
                eyre::bail!("simulation.{field} must be finite and >= 0");
            }
        }
        if sim.coupling_per_s > 1.0 || sim.loss_per_s + sim.fan_loss_per_s > 1.0 {
            eyre::bail!("simulation rates above 1/s are unstable at the 10 ms integration step");
        }

        Ok(())
    }
}
