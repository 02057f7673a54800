//! Tencent Cloud API v3 response envelope

use serde::Deserialize;
use serde_json::{Map, Value};

/// `{"Response": {...}}`
#[derive(Debug, Deserialize)]
pub struct TencentResponse {
    #[serde(rename = "Response")]
    pub response: Map<String, Value>,
}

/// Error payload nested inside Tencent Cloud responses.
#[derive(Debug, Deserialize)]
pub struct TencentError {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
}
