//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use reflow_core::Profile;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Effective limits used for the current run (for JSON details).
pub static LAST_LIMITS: OnceLock<CliLimits> = OnceLock::new();

#[derive(Copy, Clone, Debug)]
pub struct CliLimits {
    pub max_run_ms: Option<u64>,
    pub stall_timeout_ms: u64,
    pub room_temp_c: f32,
}

#[derive(Parser, Debug)]
#[command(name = "reflow", version, about = "Hotplate reflow controller")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProfileArg {
    /// SAC305-style paste, 250 °C peak
    LeadFree,
    /// Sn63/Pb37 paste, 224 °C peak
    Leaded,
}

impl From<ProfileArg> for Profile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::LeadFree => Profile::LeadFree,
            ProfileArg::Leaded => Profile::Leaded,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one reflow cycle on the simulated hotplate
    Run {
        /// Select and persist this profile before starting
        #[arg(long, value_enum, value_name = "PROFILE")]
        profile: Option<ProfileArg>,
        /// Pace the loop with the wall clock instead of virtual time
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Pace the control loop with the wall clock.\n\nBy default the simulated plate runs on a virtual clock and a full cycle finishes in well under a second. With --realtime every poll sleeps for timing.poll_ms and a cycle takes as long as it would on a real plate (roughly 15 minutes)."
        )]
        realtime: bool,
        /// Abort the cycle after this many seconds
        #[arg(long, value_name = "SECS")]
        max_run_s: Option<u64>,
        /// Write per-sample `time_s,setpoint,temperature,output` rows to this CSV file
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,
    },
    /// Show or toggle the persisted profile selection
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Read the sensor once and report the plate temperature
    SelfCheck,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ProfileAction {
    /// Print the selected profile
    Show,
    /// Switch between lead-free and leaded and persist the choice
    Toggle,
}
