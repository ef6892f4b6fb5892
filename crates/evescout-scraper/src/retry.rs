//! Retry loop for transient fetch failures.
//!
//! The retry schedule is linear: attempts are spaced by the rate governor,
//! which every operation acquires before touching the network, so this
//! module adds no sleep of its own. 4xx responses and extraction failures
//! are propagated immediately without retrying; a client error will not
//! get better on a second attempt.

use std::future::Future;

use crate::error::ScraperError;

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Retriable:
/// - [`ScraperError::Http`]: network-level failure (timeout, connection reset).
/// - [`ScraperError::ServerStatus`]: 5xx; the server may recover.
/// - [`ScraperError::Browser`]: navigation timeout or lost session.
///
/// Everything else (404, other 4xx, extraction failures) is propagated
/// immediately.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::Http(_) | ScraperError::ServerStatus { .. } | ScraperError::Browser { .. }
    )
}

/// Executes `operation` with up to `max_retries` additional attempts on
/// transient errors. Returns the last error once the budget is exhausted.
pub(crate) async fn retry_transient<T, F, Fut>(
    max_retries: u32,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                tracing::warn!(
                    attempt,
                    max_retries,
                    error = %err,
                    "transient fetch error, retrying"
                );
                attempt += 1;
            }
        }
    }
}
