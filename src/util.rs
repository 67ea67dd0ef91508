//! Pace projections. Pure functions of (count, elapsed seconds); nothing
//! here is persisted, the presentation layer computes these on demand.

pub fn reps_per_minute(count: i64, elapsed_seconds: i64) -> Option<f64> {
    match elapsed_seconds {
        secs if secs > 0 => Some((count as f64 / secs as f64) * 60.0),
        _ => None,
    }
}

pub fn reps_per_hour(count: i64, elapsed_seconds: i64) -> Option<f64> {
    reps_per_minute(count, elapsed_seconds).map(|per_min| per_min * 60.0)
}
