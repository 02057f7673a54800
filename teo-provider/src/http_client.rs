//! Generic HTTP execution helpers
//!
//! The Tencent Cloud client signs and builds the `RequestBuilder` itself; this
//! module owns the parts every call shares: sending, logging, status handling,
//! response decoding and transport-level retries.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ProviderError;
use crate::utils::log_sanitizer::truncate_for_log;

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Performs an HTTP request and returns the status code and response text.
    ///
    /// HTTP 429 becomes [`ProviderError::RateLimited`] (honouring `Retry-After`),
    /// 502/503/504 become [`ProviderError::NetworkError`], client timeouts become
    /// [`ProviderError::Timeout`].
    pub async fn execute_request(
        request_builder: RequestBuilder,
        service: &str,
        action: &str,
    ) -> Result<(u16, String), ProviderError> {
        log::debug!("[{service}] POST Action: {action}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    action: action.to_string(),
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    action: action.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[{service}] {action} Response Status: {status_code}");

        // Retry-After 必须在读取 body 之前取出
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if status_code == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{service}] {action} rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(ProviderError::RateLimited {
                action: action.to_string(),
                retry_after,
                raw_code: None,
                raw_message: Some(body),
            });
        }

        if matches!(status_code, 502..=504) {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{service}] {action} server error (HTTP {status_code})");
            return Err(ProviderError::NetworkError {
                action: action.to_string(),
                detail: format!("HTTP {status_code}: {}", truncate_for_log(&body)),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                action: action.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{service}] {action} Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }

    /// Parse a JSON response body into `T`.
    pub fn parse_json<T>(response_text: &str, action: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{action}] JSON parse failed: {e}");
            log::error!("[{action}] Raw response: {}", truncate_for_log(response_text));
            ProviderError::ParseError {
                action: action.to_string(),
                detail: e.to_string(),
            }
        })
    }

    /// Performs an HTTP request, retrying transport failures.
    ///
    /// Only network errors, timeouts and HTTP-level rate limiting are retried
    /// here, with exponential backoff (100ms, 200ms, 400ms, ... capped at 10s).
    /// API error codes are handled one level up by [`crate::retry`].
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        service: &str,
        action: &str,
        max_retries: u32,
    ) -> Result<(u16, String), ProviderError> {
        if max_retries == 0 {
            return Self::execute_request(request_builder, service, action).await;
        }

        let mut last_error = None;

        for attempt in 0..=max_retries {
            // RequestBuilder 只能发送一次
            let Some(req) = request_builder.try_clone() else {
                log::warn!("[{service}] Cannot clone request, disabling retry");
                return Self::execute_request(request_builder, service, action).await;
            };

            match Self::execute_request(req, service, action).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < max_retries && is_transport_retryable(&e) => {
                    let delay = retry_delay(&e, attempt);
                    log::warn!(
                        "[{}] {} failed (attempt {}/{}), retrying in {:.1}s: {}",
                        service,
                        action,
                        attempt + 1,
                        max_retries,
                        delay.as_secs_f32(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::NetworkError {
            action: action.to_string(),
            detail: "All retries exhausted with no error captured".to_string(),
        }))
    }
}

fn is_transport_retryable(error: &ProviderError) -> bool {
    matches!(
        error,
        ProviderError::NetworkError { .. }
            | ProviderError::Timeout { .. }
            | ProviderError::RateLimited { .. }
    )
}

/// `RateLimited` with `retry_after` waits that long (capped at 30s), anything else backs off.
fn retry_delay(error: &ProviderError, attempt: u32) -> Duration {
    if let ProviderError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(30))
    } else {
        backoff_delay(attempt)
    }
}

/// Exponential backoff: 100ms, 200ms, 400ms, 800ms, 1.6s, ... capped at 10 seconds.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(10_000))
}
