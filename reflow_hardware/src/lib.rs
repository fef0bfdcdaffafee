//! Simulated hotplate and host-side persistence for the reflow controller.

pub mod error;
pub mod sim;
pub mod store;

pub use sim::{PlateParams, SimFaults, SimHeater, SimIndicators, SimPlate, SimSensor};
pub use error::HwError;
pub use store::FileProfileStore;
