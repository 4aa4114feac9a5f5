//! Signed per-metric deltas between a baseline and a current aggregation.

/// Delta between two float metrics, three decimals, always signed.
#[must_use]
pub fn diff_value(to: f64, from: f64) -> String {
    let delta = to - from;
    if delta >= 0.0 {
        format!("+{:.3}", delta)
    } else {
        format!("{:.3}", delta)
    }
}

/// Delta between two counts, always signed.
#[must_use]
pub fn diff_count(to: u64, from: u64) -> String {
    let delta = to as i64 - from as i64;
    if delta >= 0 {
        format!("+{}", delta)
    } else {
        format!("{}", delta)
    }
}

/// Annotate a rendered cell with its delta.
#[must_use]
pub fn with_diff(value: &str, delta: &str) -> String {
    format!("{} ({})", value, delta)
}
