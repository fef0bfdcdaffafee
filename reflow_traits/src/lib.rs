pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Thermocouple / thermistor front end. Returns degrees Celsius.
pub trait TempSensor {
    fn read(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
}

/// Solid-state relay driving the heating element.
pub trait Heater {
    fn set(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Fan and buzzer. Fire-and-forget from the controller's point of view.
pub trait Indicators {
    fn set_fan(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn sound(
        &mut self,
        tone_hz: u32,
        duration: std::time::Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Single-byte non-volatile slot holding the selected profile.
///
/// `load` returns `None` when the slot has never been written.
pub trait ProfileStore {
    fn load(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>>;
    fn save(&mut self, value: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
