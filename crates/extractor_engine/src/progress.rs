use std::time::Duration;

/// Synthetic progress for a wait of known length: the elapsed share of
/// `budget`, floored to a whole percent and clamped to 0..=100.
pub fn progress_at(elapsed: Duration, budget: Duration) -> u8 {
    if budget.is_zero() {
        return 100;
    }
    let ratio = elapsed.as_secs_f64() / budget.as_secs_f64();
    (ratio * 100.0).clamp(0.0, 100.0).floor() as u8
}
