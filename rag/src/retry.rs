use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::Result;

/// Bounded retry with randomized exponential backoff.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping.
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    ///
    /// Drawn uniformly from `[0, min(max_delay, 2^attempt s)]`, then clamped
    /// to `[min_delay, max_delay]`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = 2f64.powi(attempt.min(32) as i32);
        let ceiling = exp.min(self.max_delay.as_secs_f64());
        let drawn = if ceiling > 0.0 {
            rand::thread_rng().gen_range(0.0..=ceiling)
        } else {
            0.0
        };
        Duration::from_secs_f64(drawn).clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the
    /// attempt cap is reached. The last error is returned on exhaustion.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        what,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;

    #[test]
    fn backoff_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 1..=10 {
            let d = policy.backoff(attempt);
            assert!(d >= policy.min_delay, "attempt {} gave {:?}", attempt, d);
            assert!(d <= policy.max_delay, "attempt {} gave {:?}", attempt, d);
        }
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let policy = RetryPolicy::immediate(6);
        let mut calls = 0;
        let res: Result<()> = policy.run("test", || {
            calls += 1;
            Err(RagError::transient("rate limited"))
        });
        assert!(res.unwrap_err().is_transient());
        assert_eq!(calls, 6);
    }

    #[test]
    fn recovers_after_transient_failures() {
        let policy = RetryPolicy::immediate(6);
        let mut calls = 0;
        let res = policy.run("test", || {
            calls += 1;
            if calls < 3 {
                Err(RagError::transient("busy"))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(res.unwrap(), 3);
    }

    #[test]
    fn service_errors_are_not_retried() {
        let policy = RetryPolicy::immediate(6);
        let mut calls = 0;
        let res: Result<()> = policy.run("test", || {
            calls += 1;
            Err(RagError::service("bad request"))
        });
        assert!(!res.unwrap_err().is_transient());
        assert_eq!(calls, 1);
    }
}
