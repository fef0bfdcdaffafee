//! Maps `Box<dyn Error>` from trait boundaries to typed `ReflowError`.
//!
//! The traits in `reflow_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `reflow_hardware::HwError` downcasting.

use crate::error::ReflowError;

/// Map a trait-boundary error to a typed `ReflowError`.
///
/// `HwError` (with `hardware-errors`) and `std::io::Error` keep their
/// category; anything else becomes `ReflowError::Hardware` with its message.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ReflowError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<reflow_hardware::error::HwError>() {
            return match hw {
                reflow_hardware::error::HwError::Io(io) => ReflowError::Io(io.to_string()),
                other => ReflowError::Hardware(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return ReflowError::Io(io.to_string());
    }
    ReflowError::Hardware(e.to_string())
}
