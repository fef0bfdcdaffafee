use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("thermocouple open circuit")]
    OpenCircuit,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
