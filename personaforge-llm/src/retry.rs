//! Retry/backoff policy. Spec §4.12 step 8 only permits one retry past the
//! first attempt ("No retry more than once"), so `production()` caps
//! `max_attempts` at 2.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    pub jitter: bool,
}

impl RetryConfig {
    /// One retry past the first attempt, per §4.12 step 8.
    pub fn production() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff_ms: 50,
            backoff_multiplier: 2.0,
            max_backoff_ms: 500,
            jitter: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            backoff_multiplier: 1.0,
            max_backoff_ms: 0,
            jitter: false,
        }
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let base_backoff = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped_backoff = base_backoff.min(self.max_backoff_ms as f64) as u64;

        let final_backoff = if self.jitter {
            let jitter_range = (capped_backoff as f64 * 0.25) as u64;
            if jitter_range == 0 {
                capped_backoff
            } else {
                let jitter = rand::random::<u64>() % (jitter_range * 2);
                capped_backoff.saturating_add(jitter).saturating_sub(jitter_range)
            }
        } else {
            capped_backoff
        };

        Duration::from_millis(final_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_allows_exactly_one_retry() {
        assert_eq!(RetryConfig::production().max_attempts, 2);
    }

    #[test]
    fn disabled_never_backs_off() {
        let cfg = RetryConfig::disabled();
        assert_eq!(cfg.backoff_for_attempt(0), Duration::from_millis(0));
    }
}
