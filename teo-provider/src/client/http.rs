//! 腾讯云 API 请求执行

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ApiTransport, ErrorContext, ProviderErrorMapper, RawApiError};

use super::sign::CONTENT_TYPE;
use super::{LANGUAGE, TencentCloudClient, TencentError, TencentResponse};

#[async_trait]
impl ApiTransport for TencentCloudClient {
    async fn call(&self, action: &str, payload: Value) -> Result<Value> {
        // 1. 序列化请求体
        let body = serde_json::to_string(&payload).map_err(|e| ProviderError::SerializationError {
            action: action.to_string(),
            detail: e.to_string(),
        })?;

        // 2. 签名
        let timestamp = Utc::now().timestamp();
        let authorization = self.sign(action, &body, timestamp);

        // 3. 发送请求
        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", &self.host)
            .header("X-TC-Action", action)
            .header("X-TC-Version", self.version)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Language", LANGUAGE)
            .header("Authorization", authorization);
        if let Some(region) = &self.region {
            request = request.header("X-TC-Region", region);
        }
        if let Some(token) = &self.security_token {
            request = request.header("X-TC-Token", token);
        }
        let request = request.body(body);

        let (_status, response_text) = HttpUtils::execute_request_with_retry(
            request,
            self.service_name(),
            action,
            self.max_retries,
        )
        .await?;

        // 4. 解析响应
        let envelope: TencentResponse = HttpUtils::parse_json(&response_text, action)?;
        self.unwrap_envelope(action, envelope)
    }
}

impl TencentCloudClient {
    /// Split the envelope into the payload or a mapped API error.
    pub(crate) fn unwrap_envelope(&self, action: &str, envelope: TencentResponse) -> Result<Value> {
        let mut response = envelope.response;
        let request_id = response
            .remove("RequestId")
            .and_then(|v| v.as_str().map(str::to_string));

        if let Some(error) = response.remove("Error") {
            let error: TencentError =
                serde_json::from_value(error).map_err(|e| self.parse_error(action, e))?;
            log::error!(
                "[CRITAL] api[{action}] fail, request id [{}], reason[{}: {}]",
                request_id.as_deref().unwrap_or("-"),
                error.code,
                error.message
            );
            return Err(self.map_error(
                RawApiError::with_code(error.code, error.message),
                ErrorContext {
                    action: action.to_string(),
                    request_id,
                },
            ));
        }

        log::debug!(
            "[DEBUG] api[{action}] success, request id [{}]",
            request_id.as_deref().unwrap_or("-")
        );
        Ok(Value::Object(response))
    }
}
