//! Tencent Cloud API v3 client (TC3-HMAC-SHA256)

mod error;
mod http;
mod sign;
mod types;

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};

pub(crate) use types::{TencentError, TencentResponse};

type HmacSha256 = Hmac<Sha256>;

pub const TEO_SERVICE: &str = "teo";
pub const TEO_VERSION: &str = "2022-09-01";
/// 接口返回的错误信息语言
const LANGUAGE: &str = "en-US";

/// 默认连接超时（秒）
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 默认请求超时（秒）
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// 创建带超时配置的 HTTP Client
pub(crate) fn create_http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::NetworkError {
            action: "CreateHttpClient".to_string(),
            detail: e.to_string(),
        })
}

/// HMAC-SHA256 计算
pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Signed client for one Tencent Cloud service endpoint.
pub struct TencentCloudClient {
    pub(crate) client: Client,
    pub(crate) secret_id: String,
    pub(crate) secret_key: String,
    pub(crate) security_token: Option<String>,
    pub(crate) region: Option<String>,
    pub(crate) scheme: &'static str,
    pub(crate) host: String,
    pub(crate) service: &'static str,
    pub(crate) version: &'static str,
    pub(crate) max_retries: u32,
}

/// `TencentCloudClient` Builder
pub struct TencentCloudClientBuilder {
    secret_id: String,
    secret_key: String,
    security_token: Option<String>,
    region: Option<String>,
    scheme: &'static str,
    host: Option<String>,
    service: &'static str,
    version: &'static str,
    max_retries: u32,
}

impl TencentCloudClientBuilder {
    fn new(secret_id: String, secret_key: String) -> Self {
        Self {
            secret_id,
            secret_key,
            security_token: None,
            region: None,
            scheme: "https",
            host: None,
            service: TEO_SERVICE,
            version: TEO_VERSION,
            max_retries: 2,
        }
    }

    #[must_use]
    pub fn security_token(mut self, token: Option<String>) -> Self {
        self.security_token = token.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        let region = region.into();
        self.region = (!region.is_empty()).then_some(region);
        self
    }

    #[must_use]
    pub fn scheme(mut self, scheme: &'static str) -> Self {
        self.scheme = scheme;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn service(mut self, service: &'static str, version: &'static str) -> Self {
        self.service = service;
        self.version = version;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn build(self) -> Result<TencentCloudClient> {
        let host = self
            .host
            .unwrap_or_else(|| format!("{}.tencentcloudapi.com", self.service));
        Ok(TencentCloudClient {
            client: create_http_client()?,
            secret_id: self.secret_id,
            secret_key: self.secret_key,
            security_token: self.security_token,
            region: self.region,
            scheme: self.scheme,
            host,
            service: self.service,
            version: self.version,
            max_retries: self.max_retries,
        })
    }
}

impl TencentCloudClient {
    pub fn builder(secret_id: impl Into<String>, secret_key: impl Into<String>) -> TencentCloudClientBuilder {
        TencentCloudClientBuilder::new(secret_id.into(), secret_key.into())
    }

    /// EdgeOne client configured from the provider settings.
    pub fn teo(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        Self::builder(config.secret_id.clone(), config.secret_key.clone())
            .security_token(config.security_token.clone())
            .region(config.region.clone())
            .scheme(config.protocol.scheme())
            .host(config.endpoint_host(TEO_SERVICE))
            .service(TEO_SERVICE, TEO_VERSION)
            .max_retries(config.max_retries)
            .build()
    }

    pub fn endpoint(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;

    #[test]
    fn teo_client_from_config() {
        let config = ProviderConfig::new("id", "key")
            .with_protocol(Protocol::Http)
            .with_domain("internal.tencentcloudapi.com")
            .with_security_token("");
        let client = TencentCloudClient::teo(&config);
        assert!(client.is_ok());
        let Ok(client) = client else { return };
        assert_eq!(client.endpoint(), "http://teo.internal.tencentcloudapi.com");
        assert_eq!(client.service, "teo");
        assert_eq!(client.version, "2022-09-01");
        assert_eq!(client.region.as_deref(), Some("ap-guangzhou"));
        assert!(client.security_token.is_none(), "empty token must be dropped");
    }

    #[test]
    fn teo_client_requires_credentials() {
        let result = TencentCloudClient::teo(&ProviderConfig::default());
        assert!(matches!(result, Err(ProviderError::Validation { .. })));
    }

    #[test]
    fn hmac_sha256_known_vector() {
        // RFC 4231 test case 2
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
