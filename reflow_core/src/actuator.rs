//! Time-proportioning heater drive.

/// Turns a continuous demand in `[0, window_ms]` into an on/off command over a
/// repeating window. The window anchor only ever advances by whole windows so
/// tick jitter never shifts its phase.
#[derive(Debug, Clone)]
pub struct TimeWindowActuator {
    window_ms: u64,
    window_start_ms: u64,
}

impl TimeWindowActuator {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: window_ms.max(1),
            window_start_ms: 0,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn window_start_ms(&self) -> u64 {
        self.window_start_ms
    }

    /// Re-anchor the window at `now_ms` (start of a cycle).
    pub fn reset(&mut self, now_ms: u64) {
        self.window_start_ms = now_ms;
    }

    /// Heater command for this tick. Always off when `enabled` is false.
    pub fn drive(&mut self, now_ms: u64, output: f32, enabled: bool) -> bool {
        self.advance(now_ms);
        if !enabled {
            return false;
        }
        #[allow(clippy::cast_precision_loss)]
        let into_window = now_ms.saturating_sub(self.window_start_ms) as f32;
        output > into_window
    }

    fn advance(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.window_start_ms);
        if elapsed >= self.window_ms {
            self.window_start_ms += (elapsed / self.window_ms) * self.window_ms;
        }
    }
}
