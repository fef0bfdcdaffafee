use thiserror::Error;

use crate::state::Stage;

/// Which safety condition ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Sensor unreadable or disconnected, at init or at runtime.
    Sensor,
    /// Temperature failed to move in the expected direction within the stall timeout.
    Stall,
}

impl core::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FaultKind::Sensor => f.write_str("sensor fault"),
            FaultKind::Stall => f.write_str("stall fault"),
        }
    }
}

/// A failed temperature read, carried into the tick as the sample value.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("sensor fault: {0}")]
pub struct SensorFault(pub String);

#[derive(Debug, Error, Clone)]
pub enum ReflowError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("process fault: {0}")]
    Fault(FaultKind),
    #[error("max run time exceeded ({max_ms} ms) in stage {stage}")]
    MaxRuntime { max_ms: u64, stage: Stage },
    #[error("plate too hot to start ({reading_c:.1} °C, must be below {limit_c:.1} °C)")]
    TooHot { reading_c: f32, limit_c: f32 },
    #[error("no temperature reading; cannot start")]
    NoReading,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing temperature sensor")]
    MissingSensor,
    #[error("missing heater")]
    MissingHeater,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
