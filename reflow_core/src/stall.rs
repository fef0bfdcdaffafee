//! Stall (runaway) detection.

/// Direction the plate temperature is expected to move in a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

impl Direction {
    /// Strict: an unchanged reading does not count as movement.
    pub fn moved(self, previous: f32, current: f32) -> bool {
        match self {
            Direction::Rising => current > previous,
            Direction::Falling => current < previous,
        }
    }
}

/// Faults when the temperature has not moved in the expected direction for
/// longer than `timeout_ms`.
#[derive(Debug, Clone)]
pub struct StallMonitor {
    timeout_ms: u64,
    last_change_ms: u64,
}

impl StallMonitor {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_change_ms: 0,
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Timestamp of the last sample that moved in the expected direction.
    pub fn last_change_ms(&self) -> u64 {
        self.last_change_ms
    }

    /// Restart the timeout window at `now_ms`.
    pub fn arm(&mut self, now_ms: u64) {
        self.last_change_ms = now_ms;
    }

    /// Evaluate one new sample. Returns `true` when the timeout has been
    /// exceeded without expected movement.
    pub fn check(&mut self, now_ms: u64, expected: Direction, previous: f32, current: f32) -> bool {
        if expected.moved(previous, current) {
            self.last_change_ms = now_ms;
            return false;
        }
        now_ms.saturating_sub(self.last_change_ms) > self.timeout_ms
    }
}
