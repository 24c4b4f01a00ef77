//! Validation of caller-supplied notification windows.

/// Returns `requested` when it lies in `(0, max_allowed]`, otherwise `default`.
///
/// Shared by the notification aggregator and the per-user notification query
/// so neither can be asked for an empty, negative, or over-long window.
#[must_use]
pub fn refine_interval(requested: i64, default: i64, max_allowed: i64) -> i64 {
    if requested > 0 && requested <= max_allowed {
        requested
    } else {
        default
    }
}
