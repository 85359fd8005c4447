use std::time::Duration;

/// Backoff schedule for a retried operation: `initial_delay * 2^(attempt-1)`
/// after the attempt-th failure, no jitter. Rate-limited failures (HTTP 429)
/// triple the computed delay instead; that path is only exercised by the
/// per-company fetch calls, never by top-level pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

/// Top-level authentication stage: 3 attempts, 1s base delay.
pub const PIPELINE_AUTH: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(1));
/// Top-level company listing stage: 3 attempts, 2s base delay.
pub const PIPELINE_COMPANIES: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(2));
/// Per-company auth/fetch calls inside the batch runner: 5 attempts,
/// 1s base delay, 429-aware.
pub const COMPANY_CALL: RetryPolicy = RetryPolicy::new(5, Duration::from_secs(1));

const RATE_LIMIT_MULTIPLIER: u32 = 3;

impl RetryPolicy {
    pub const fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Delay to sleep after `failed_attempt` (1-based) before the next try.
    pub fn delay_after_failure(&self, failed_attempt: u32, rate_limited: bool) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        let base = self.initial_delay * 2u32.pow(exponent);
        if rate_limited {
            base * RATE_LIMIT_MULTIPLIER
        } else {
            base
        }
    }
}
