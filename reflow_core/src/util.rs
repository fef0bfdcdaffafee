//! Common time helpers for reflow_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Whether periodic work last run at `last_ms` is due again at `now_ms`.
/// Work that has never run is always due.
#[inline]
pub fn is_due(now_ms: u64, last_ms: Option<u64>, interval_ms: u64) -> bool {
    last_ms.is_none_or(|last| now_ms.saturating_sub(last) >= interval_ms)
}

/// Milliseconds to fractional seconds, for traces and reports.
#[inline]
#[allow(clippy::cast_precision_loss)]
pub fn ms_to_s(ms: u64) -> f64 {
    ms as f64 / MILLIS_PER_SEC as f64
}
