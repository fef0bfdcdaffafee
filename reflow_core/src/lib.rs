#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core reflow control logic (hardware-agnostic).
//!
//! All hardware interactions go through the `reflow_traits` seams
//! (`TempSensor`, `Heater`, `Indicators`, `ProfileStore`).
//!
//! ## Architecture
//!
//! - **Profiles**: static soak/reflow parameters per alloy (`profile`)
//! - **Control**: PID with per-stage gain sets (`pid`) and time-proportioning
//!   heater drive (`actuator`)
//! - **Safety**: stall detection (`stall`), sensor faults, Error stage
//! - **State machine**: the pure per-tick control law (`machine::tick`)
//! - **Scheduler**: `Station` owns the I/O, gates sampling and display
//!   refresh, applies `Actions`; `runner::run_cycle` drives a full cycle

pub mod actuator;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod machine;
pub mod mocks;
pub mod pid;
pub mod profile;
pub mod runner;
pub mod stall;
pub mod state;
pub mod station;
pub mod util;

pub use actuator::TimeWindowActuator;
pub use builder::StationBuilder;
pub use config::{BuzzerCfg, ControlCfg, PidCfg, SafetyCfg, TimingCfg};
pub use error::{BuildError, FaultKind, ReflowError, Result, SensorFault};
pub use machine::{Actions, Commands, Sample, Tone, Transition, tick};
pub use pid::{GainSchedule, GainStage, PidController, PidGains};
pub use profile::{Profile, ProfileParams};
pub use runner::{CycleOutcome, RunOptions, run_cycle};
pub use stall::{Direction, StallMonitor};
pub use state::{ProcessState, Snapshot, Stage};
pub use station::{DisplaySink, Station, TickReport};
