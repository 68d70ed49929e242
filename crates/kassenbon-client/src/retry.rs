//! Retry with exponential backoff for transient portal errors.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// Returns `true` if `err` is a transient condition worth retrying after a
/// backoff delay.
///
/// Retriable: [`ClientError::RateLimited`] (the server asked us to back
/// off) and [`ClientError::Http`] (network-level failure). Everything else
/// is deterministic — an expired session, a missing ticket, or a malformed
/// body comes back identical on the next attempt.
fn is_retriable(err: &ClientError) -> bool {
    matches!(
        err,
        ClientError::RateLimited { .. } | ClientError::Http(_)
    )
}

/// Delay before the next attempt: exponential backoff, raised to the
/// server's `Retry-After` when a rate-limit response asked for more.
fn delay_secs_for(err: &ClientError, attempt: u32, backoff_base_secs: u64) -> u64 {
    let backoff = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        ClientError::RateLimited {
            retry_after_secs, ..
        } => backoff.max(*retry_after_secs),
        _ => backoff,
    }
}

/// Executes `operation` with exponential backoff retries on transient
/// errors: the wait before the n-th retry is `backoff_base_secs * 2^(n-1)`
/// seconds, or the server's `Retry-After` if that is longer, up to
/// `max_retries` additional attempts after the first try. Non-retriable
/// errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay_secs = delay_secs_for(&err, attempt, backoff_base_secs);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_secs,
                    error = %err,
                    "transient portal error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> ClientError {
        ClientError::RateLimited {
            domain: "www.lidl.de".to_owned(),
            retry_after_secs: 0,
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(delay_secs_for(&rate_limited(), 0, 5), 5);
        assert_eq!(delay_secs_for(&rate_limited(), 1, 5), 10);
        assert_eq!(delay_secs_for(&rate_limited(), 2, 5), 20);
    }

    #[test]
    fn retry_after_raises_the_delay_floor() {
        let err = ClientError::RateLimited {
            domain: "www.lidl.de".to_owned(),
            retry_after_secs: 30,
        };
        // Server asked for 30s; the 5s backoff must not undercut it.
        assert_eq!(delay_secs_for(&err, 0, 5), 30);
        // Once the backoff exceeds the request, backoff wins.
        assert_eq!(delay_secs_for(&err, 3, 5), 40);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ClientError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, ClientError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ClientError>(rate_limited())
            }
        })
        .await;
        // max_retries=2 means 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ClientError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_unauthorized() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ClientError>(ClientError::Unauthorized {
                    url: "https://www.lidl.de/mre/api/v1/tickets".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ClientError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_missing_receipt_html() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ClientError>(ClientError::MissingReceiptHtml {
                    ticket_id: "9".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ClientError::MissingReceiptHtml { .. })));
    }
}
