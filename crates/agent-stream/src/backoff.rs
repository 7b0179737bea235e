//! Reconnect backoff schedule.

/// Delay in seconds before reconnect attempt `attempt` (1-based).
///
/// Doubles from `base_secs` and never exceeds `max_secs`. Attempts are
/// unbounded; once the cap is reached every further delay stays there.
pub fn reconnect_delay_secs(attempt: u32, base_secs: u64, max_secs: u64) -> u64 {
    let exp = attempt.saturating_sub(1).min(63);
    let delay = base_secs.saturating_mul(1u64 << exp);
    delay.min(max_secs)
}
