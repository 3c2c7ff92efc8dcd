//! Exponential backoff with full jitter (§4.2 retry policy).

use rand::Rng;
use std::time::Duration;

/// The deterministic upper bound for the `attempt`-th retry delay, before jitter:
/// `min(base * 2^attempt, max)`. `attempt` is zero-indexed (the first retry is attempt 0).
pub fn exponential_cap_ms(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> u64 {
    base_delay_ms
        .saturating_mul(1u64 << attempt.min(32))
        .min(max_delay_ms)
}

/// Picks a uniformly random delay in `[0, cap]`, where `cap` is `exponential_cap_ms`. Full
/// jitter spreads retries across the whole window instead of clustering them at the cap.
pub fn full_jitter_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64, rng: &mut impl Rng) -> Duration {
    let cap = exponential_cap_ms(attempt, base_delay_ms, max_delay_ms);
    let millis = if cap == 0 { 0 } else { rng.gen_range(0..=cap) };
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_doubles_each_attempt_until_the_ceiling() {
        assert_eq!(exponential_cap_ms(0, 2000, 60_000), 2000);
        assert_eq!(exponential_cap_ms(1, 2000, 60_000), 4000);
        assert_eq!(exponential_cap_ms(2, 2000, 60_000), 8000);
    }

    #[test]
    fn cap_never_exceeds_the_configured_maximum() {
        assert_eq!(exponential_cap_ms(10, 2000, 60_000), 60_000);
    }

    #[test]
    fn jittered_delay_never_exceeds_the_cap() {
        let mut rng = rand::thread_rng();
        for attempt in 0..6 {
            let delay = full_jitter_delay(attempt, 2000, 60_000, &mut rng);
            assert!(delay.as_millis() as u64 <= exponential_cap_ms(attempt, 2000, 60_000));
        }
    }
}
