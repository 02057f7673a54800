use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ProviderError, Result};
use crate::resource_data::ResourceData;
use crate::schema::Schema;

/// 原始 API 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// 错误码，例如 `ResourceNotFound.ZoneNotFound`
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
}

impl RawApiError {
    #[cfg(test)]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// 错误上下文信息（内部使用）
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// 触发错误的 API Action
    pub action: String,
    /// 响应中的 `RequestId`，便于排查
    pub request_id: Option<String>,
}

impl ErrorContext {
    pub fn action(action: &str) -> Self {
        Self {
            action: action.to_string(),
            request_id: None,
        }
    }
}

/// 错误映射 Trait（内部使用）
/// 将 API 原始错误码映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    /// 服务标识符（用于日志）
    fn service_name(&self) -> &'static str;

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    fn parse_error(&self, action: &str, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            action: action.to_string(),
            detail: detail.to_string(),
        }
    }

    fn unknown_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        ProviderError::Unknown {
            action: context.action,
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// Signed request seam between the service layer and the wire.
///
/// `call` sends one API action with a JSON payload and returns the inner
/// `Response` object (without `RequestId`/`Error`). Errors reported by the API
/// are already mapped to [`ProviderError`].
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn call(&self, action: &str, payload: Value) -> Result<Value>;
}

/// A declarative resource: one manageable remote object.
///
/// Handlers receive the instance's [`ResourceData`] and must leave it
/// describing the remote object. A `read` that finds nothing clears the ID.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name used in configurations, e.g. `tencentcloud_teo_zone`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, d: &mut ResourceData) -> Result<()>;

    async fn read(&self, d: &mut ResourceData) -> Result<()>;

    async fn update(&self, d: &mut ResourceData) -> Result<()>;

    async fn delete(&self, d: &mut ResourceData) -> Result<()>;

    /// Import by ID. Default is passthrough: the ID is taken as-is and read.
    async fn import(&self, d: &mut ResourceData) -> Result<()> {
        self.read(d).await
    }
}

/// A read-only query against the remote API.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, d: &mut ResourceData) -> Result<()>;
}
