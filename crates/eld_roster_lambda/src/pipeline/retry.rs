use std::future::Future;

use serde_json::json;

use crate::adapters::upstream::UpstreamError;
use crate::logging::{log_error, log_info};
use crate::runtime::retry::RetryPolicy;

/// An operation that stayed failed through its whole retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryError {
    pub name: String,
    pub attempts: u32,
    pub last_error: UpstreamError,
}

impl std::fmt::Display for RetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed after {} attempts: {}",
            self.name, self.attempts, self.last_error
        )
    }
}

impl std::error::Error for RetryError {}

/// Run `operation` under the given retry policy, sleeping the policy's
/// backoff schedule between attempts. Rate-limited failures stretch the
/// schedule per `RetryPolicy::delay_after_failure`.
pub async fn execute<T, F, Fut>(
    name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = UpstreamError::message("operation was never attempted");

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    log_info(
                        "retry",
                        "recovered",
                        json!({"operation": name, "attempt": attempt}),
                    );
                }
                return Ok(value);
            }
            Err(error) => {
                let rate_limited = error.is_rate_limited();
                log_error(
                    "retry",
                    "attempt_failed",
                    json!({
                        "operation": name,
                        "attempt": attempt,
                        "max_attempts": max_attempts,
                        "rate_limited": rate_limited,
                        "error": error.to_string(),
                    }),
                );
                last_error = error;

                if attempt < max_attempts {
                    tokio::time::sleep(policy.delay_after_failure(attempt, rate_limited)).await;
                }
            }
        }
    }

    Err(RetryError {
        name: name.to_string(),
        attempts: max_attempts,
        last_error,
    })
}
