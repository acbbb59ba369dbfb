//! Exponential backoff for venue stream reconnection (spec §4.1, §8 invariant 6).

use std::time::Duration;

/// `d_n = min(initial * multiplier^n, max)`. `attempt` is 0-indexed; once
/// `attempt >= max_attempts`, the policy is exhausted and `delay_for`
/// returns `None`.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub multiplier: u32,
    pub max: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            multiplier: 2,
            max: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = self.multiplier.saturating_pow(attempt);
        Some(self.initial.saturating_mul(factor).min(self.max))
    }
}
