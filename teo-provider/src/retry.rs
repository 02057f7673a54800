//! Time-bounded retry of API calls and status polling.
//!
//! Every remote call made by a resource handler runs inside
//! [`retry_with_timeout`]: transient failures are retried with exponential
//! backoff until the window closes, permanent failures surface immediately.
//! Long-running remote operations (deployments, ACL activation) are awaited
//! with [`wait_for_state`].

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{ProviderError, Result};
use crate::http_client::backoff_delay;

/// Default retry window for read (describe) calls.
pub const READ_RETRY_TIMEOUT: Duration = Duration::from_secs(3 * 60);
/// Default retry window for write (create/modify/delete) calls.
pub const WRITE_RETRY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Error codes that are worth another attempt. A code matches either exactly
/// or through its prefix before the first `.` (`InternalError.DbError`).
const RETRYABLE_CODES: &[&str] = &[
    "FailedOperation",
    "InternalError",
    "TradeUnknownError",
    "RequestLimitExceeded",
    "ResourceInUse",
    "ResourceInsufficient",
    "ResourceUnavailable",
    "ResourceBusy",
];

/// Retry windows applied by the service layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            read_timeout: READ_RETRY_TIMEOUT,
            write_timeout: WRITE_RETRY_TIMEOUT,
        }
    }
}

/// Outcome of one attempt inside [`retry_with_timeout`].
#[derive(Debug)]
pub enum RetryError {
    Retryable(ProviderError),
    NonRetryable(ProviderError),
}

impl RetryError {
    /// Classify with the default retryable code list.
    pub fn classify(error: ProviderError) -> Self {
        Self::classify_with(error, &[])
    }

    /// Classify, additionally treating `extra_codes` as retryable.
    pub fn classify_with(error: ProviderError, extra_codes: &[&str]) -> Self {
        let transport = matches!(
            error,
            ProviderError::NetworkError { .. }
                | ProviderError::Timeout { .. }
                | ProviderError::RateLimited { .. }
        );
        let by_code = error
            .api_code()
            .is_some_and(|code| is_retryable_code(code, extra_codes));

        if transport || by_code {
            Self::Retryable(error)
        } else {
            Self::NonRetryable(error)
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    pub fn into_inner(self) -> ProviderError {
        match self {
            Self::Retryable(e) | Self::NonRetryable(e) => e,
        }
    }
}

impl From<ProviderError> for RetryError {
    fn from(error: ProviderError) -> Self {
        Self::classify(error)
    }
}

fn is_retryable_code(code: &str, extra_codes: &[&str]) -> bool {
    let short = code.split('.').next().unwrap_or(code);
    let matches = |list: &[&str]| list.iter().any(|c| *c == code || *c == short);
    matches(RETRYABLE_CODES) || matches(extra_codes)
}

/// Run `op` until it succeeds, fails permanently or `timeout` elapses.
///
/// The operation is always attempted at least once. When the window closes
/// the last transient error is reported as [`ProviderError::RetryTimeout`].
pub async fn retry_with_timeout<T, F, Fut>(operation: &str, timeout: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RetryError>>,
{
    let deadline = Instant::now() + timeout;
    let mut attempt = 0_u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(e)) => return Err(e),
            Err(RetryError::Retryable(e)) => {
                let now = Instant::now();
                if now >= deadline {
                    log::error!("[{operation}] retry window of {}s exhausted: {e}", timeout.as_secs());
                    return Err(ProviderError::RetryTimeout {
                        operation: operation.to_string(),
                        timeout_secs: timeout.as_secs(),
                        last_error: Some(e.to_string()),
                    });
                }
                let delay = backoff_delay(attempt).min(deadline - now);
                log::warn!(
                    "[{operation}] attempt {} failed, retrying in {:.1}s: {e}",
                    attempt + 1,
                    delay.as_secs_f32()
                );
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Poll settings for [`wait_for_state`].
#[derive(Debug, Clone, Copy)]
pub struct StateWait<'a> {
    pub operation: &'a str,
    pub timeout: Duration,
    pub interval: Duration,
    pub target: &'a [&'a str],
    pub fail: &'a [&'a str],
}

impl<'a> StateWait<'a> {
    pub fn new(operation: &'a str, timeout: Duration, target: &'a [&'a str]) -> Self {
        Self {
            operation,
            timeout,
            interval: Duration::from_secs(3),
            target,
            fail: &[],
        }
    }

    #[must_use]
    pub fn fail_on(mut self, fail: &'a [&'a str]) -> Self {
        self.fail = fail;
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Poll `refresh` until it reports one of the target states.
///
/// `refresh` returns the current status, or `None` while the object is not
/// visible yet. Transient refresh errors are retried inside the same window.
pub async fn wait_for_state<F, Fut>(wait: StateWait<'_>, mut refresh: F) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    let deadline = Instant::now() + wait.timeout;
    let mut last_state: Option<String> = None;

    loop {
        match refresh().await {
            Ok(Some(state)) => {
                if wait.target.contains(&state.as_str()) {
                    log::debug!("[{}] reached state `{state}`", wait.operation);
                    return Ok(state);
                }
                if wait.fail.contains(&state.as_str()) {
                    log::error!("[{}] entered failure state `{state}`", wait.operation);
                    return Err(ProviderError::UnexpectedState {
                        operation: wait.operation.to_string(),
                        state,
                    });
                }
                log::debug!(
                    "[{}] state `{state}`, waiting for {:?}",
                    wait.operation,
                    wait.target
                );
                last_state = Some(state);
            }
            Ok(None) => log::debug!("[{}] object not visible yet", wait.operation),
            Err(e) => match RetryError::classify(e) {
                RetryError::Retryable(e) => {
                    log::warn!("[{}] refresh failed, will retry: {e}", wait.operation);
                }
                RetryError::NonRetryable(e) => return Err(e),
            },
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ProviderError::RetryTimeout {
                operation: wait.operation.to_string(),
                timeout_secs: wait.timeout.as_secs(),
                last_error: last_state.map(|s| format!("last state `{s}`")),
            });
        }
        tokio::time::sleep(wait.interval.min(deadline - now)).await;
    }
}
