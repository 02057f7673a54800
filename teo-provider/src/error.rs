use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Unified error type for every EdgeOne resource and data source operation.
///
/// API-derived variants carry the `action` that produced them plus the raw
/// Tencent Cloud error code, so callers can still branch on codes that have
/// no dedicated variant. All variants are serializable for structured
/// diagnostics reported back to the plugin host.
///
/// # Retryable Errors
///
/// [`crate::retry::RetryError::classify`] treats the following as transient:
/// - [`NetworkError`](Self::NetworkError), [`Timeout`](Self::Timeout),
///   [`RateLimited`](Self::RateLimited)
/// - [`OperationFailed`](Self::OperationFailed), [`ResourceInUse`](Self::ResourceInUse),
///   [`ServiceUnavailable`](Self::ServiceUnavailable)
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, HTTP 502-504).
    #[error("[{action}] Network error: {detail}")]
    NetworkError { action: String, detail: String },

    /// The HTTP request timed out.
    #[error("[{action}] Request timeout: {detail}")]
    Timeout { action: String, detail: String },

    /// The API rate limit has been exceeded (HTTP 429 or `RequestLimitExceeded`).
    #[error("[{action}] Rate limited{}{}", retry_suffix(.retry_after.as_ref()), message_suffix(.raw_message.as_deref()))]
    RateLimited {
        action: String,
        retry_after: Option<u64>,
        raw_code: Option<String>,
        raw_message: Option<String>,
    },

    /// The secret id / secret key (or temporary token) was rejected.
    #[error("[{action}] Invalid credentials{}", message_suffix(.raw_message.as_deref()))]
    InvalidCredentials {
        action: String,
        raw_code: Option<String>,
        raw_message: Option<String>,
    },

    /// The credentials are valid but lack permission for the action.
    #[error("[{action}] Permission denied{}", message_suffix(.raw_message.as_deref()))]
    PermissionDenied {
        action: String,
        raw_code: Option<String>,
        raw_message: Option<String>,
    },

    /// The remote object does not exist.
    #[error("[{action}] Resource not found ({raw_code}): {raw_message}")]
    ResourceNotFound {
        action: String,
        raw_code: String,
        raw_message: String,
    },

    /// The remote object is referenced or locked by another operation.
    #[error("[{action}] Resource in use ({raw_code}): {raw_message}")]
    ResourceInUse {
        action: String,
        raw_code: String,
        raw_message: String,
    },

    /// A request parameter was rejected by the API.
    #[error("[{action}] Invalid parameter ({raw_code}): {raw_message}")]
    InvalidParameter {
        action: String,
        raw_code: String,
        raw_message: String,
    },

    /// The account's quota has been exhausted. Not transient.
    #[error("[{action}] Quota exceeded ({raw_code}): {raw_message}")]
    QuotaExceeded {
        action: String,
        raw_code: String,
        raw_message: String,
    },

    /// `FailedOperation.*`: the API refused the operation in the object's current state.
    #[error("[{action}] Operation failed ({raw_code}): {raw_message}")]
    OperationFailed {
        action: String,
        raw_code: String,
        raw_message: String,
    },

    /// Internal, busy or unavailable backend.
    #[error("[{action}] Service unavailable ({raw_code}): {raw_message}")]
    ServiceUnavailable {
        action: String,
        raw_code: String,
        raw_message: String,
    },

    /// Failed to parse the API response.
    #[error("[{action}] Parse error: {detail}")]
    ParseError { action: String, detail: String },

    /// Failed to serialize a request body.
    #[error("[{action}] Serialization error: {detail}")]
    SerializationError { action: String, detail: String },

    /// The configuration does not satisfy the schema.
    #[error("[{resource}] Invalid configuration: {}", .diagnostics.join("; "))]
    Validation {
        resource: String,
        diagnostics: Vec<String>,
    },

    /// A composite resource ID does not have the expected number of parts.
    #[error("id is broken, {id}")]
    BrokenId { id: String },

    /// An update tried to change an argument that cannot be changed in place.
    #[error("[{resource}] argument `{argument}` cannot be changed")]
    ImmutableArgument { resource: String, argument: String },

    /// A retry window or state waiter ran out of time.
    #[error("[{operation}] Timed out after {timeout_secs}s{}", message_suffix(.last_error.as_deref()))]
    RetryTimeout {
        operation: String,
        timeout_secs: u64,
        last_error: Option<String>,
    },

    /// A waiter observed a terminal failure status.
    #[error("[{operation}] Unexpected state `{state}`")]
    UnexpectedState { operation: String, state: String },

    /// Local file output (`result_output_file`) failed.
    #[error("Failed to write {path}: {detail}")]
    Io { path: String, detail: String },

    /// The remote object was created but a later step of the create failed.
    ///
    /// `state` is what is known about the object; the host should keep it
    /// (tainted) so the object can be replaced or deleted later.
    #[error("[{resource}] created `{id}` but failed afterwards: {source}")]
    PartiallyCreated {
        resource: String,
        id: String,
        state: Map<String, Value>,
        source: Box<ProviderError>,
    },

    /// An unrecognized API error code.
    #[error("[{action}] {}{raw_message}", code_prefix(.raw_code.as_deref()))]
    Unknown {
        action: String,
        raw_code: Option<String>,
        raw_message: String,
    },
}

fn retry_suffix(retry_after: Option<&u64>) -> String {
    retry_after.map_or_else(String::new, |secs| format!(" (retry after {secs}s)"))
}

fn message_suffix(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(": {m}"))
}

fn code_prefix(code: Option<&str>) -> String {
    code.map_or_else(String::new, |c| format!("{c}: "))
}

impl ProviderError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        if let Self::PartiallyCreated { source, .. } = self {
            return source.is_expected();
        }
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::PermissionDenied { .. }
                | Self::ResourceNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::QuotaExceeded { .. }
                | Self::Validation { .. }
                | Self::BrokenId { .. }
                | Self::ImmutableArgument { .. }
        )
    }

    /// Raw Tencent Cloud error code, when the error came from the API.
    #[must_use]
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::ResourceNotFound { raw_code, .. }
            | Self::ResourceInUse { raw_code, .. }
            | Self::InvalidParameter { raw_code, .. }
            | Self::QuotaExceeded { raw_code, .. }
            | Self::OperationFailed { raw_code, .. }
            | Self::ServiceUnavailable { raw_code, .. } => Some(raw_code),
            Self::RateLimited { raw_code, .. }
            | Self::InvalidCredentials { raw_code, .. }
            | Self::PermissionDenied { raw_code, .. }
            | Self::Unknown { raw_code, .. } => raw_code.as_deref(),
            Self::PartiallyCreated { source, .. } => source.api_code(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }

    /// State of an object left behind by a failed create.
    #[must_use]
    pub fn partial_state(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::PartiallyCreated { state, .. } => Some(state),
            _ => None,
        }
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, ProviderError>;
