//! Stand-in collaborators for optional `Station` parts.

use crate::state::Snapshot;
use crate::station::DisplaySink;

/// Accepts and discards fan and buzzer commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicators;

impl reflow_traits::Indicators for NullIndicators {
    fn set_fan(&mut self, _on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn sound(
        &mut self,
        _tone_hz: u32,
        _duration: std::time::Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Display that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn show(&mut self, _snapshot: &Snapshot) {}
}

/// Profile slot that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct VolatileStore {
    pub value: Option<u8>,
}

impl reflow_traits::ProfileStore for VolatileStore {
    fn load(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.value)
    }

    fn save(&mut self, value: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.value = Some(value);
        Ok(())
    }
}
