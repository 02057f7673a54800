//! Provider configuration.
//!
//! Values come from the host-supplied provider block (JSON) and fall back to
//! the `TENCENTCLOUD_*` environment variables.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::retry::RetryPolicy;

pub const ENV_SECRET_ID: &str = "TENCENTCLOUD_SECRET_ID";
pub const ENV_SECRET_KEY: &str = "TENCENTCLOUD_SECRET_KEY";
pub const ENV_SECURITY_TOKEN: &str = "TENCENTCLOUD_SECURITY_TOKEN";
pub const ENV_REGION: &str = "TENCENTCLOUD_REGION";
pub const ENV_PROTOCOL: &str = "TENCENTCLOUD_PROTOCOL";
pub const ENV_DOMAIN: &str = "TENCENTCLOUD_DOMAIN";

pub const DEFAULT_REGION: &str = "ap-guangzhou";
pub const DEFAULT_DOMAIN: &str = "tencentcloudapi.com";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_READ_RETRY_TIMEOUT_SECS: u64 = 180;
const DEFAULT_WRITE_RETRY_TIMEOUT_SECS: u64 = 300;

/// Scheme used to reach the API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Https,
    Http,
}

impl Protocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "HTTPS" => Some(Self::Https),
            "HTTP" => Some(Self::Http),
            _ => None,
        }
    }
}

/// Provider-level settings shared by every resource.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub secret_id: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    #[serde(skip_serializing)]
    pub security_token: Option<String>,
    pub region: String,
    pub protocol: Protocol,
    pub domain: String,
    /// Transport-level retries for network failures.
    pub max_retries: u32,
    pub read_retry_timeout_secs: u64,
    pub write_retry_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            secret_id: String::new(),
            secret_key: String::new(),
            security_token: None,
            region: DEFAULT_REGION.to_string(),
            protocol: Protocol::Https,
            domain: DEFAULT_DOMAIN.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            read_retry_timeout_secs: DEFAULT_READ_RETRY_TIMEOUT_SECS,
            write_retry_timeout_secs: DEFAULT_WRITE_RETRY_TIMEOUT_SECS,
        }
    }
}

// 避免密钥出现在日志中
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .field("security_token", &self.security_token.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .field("protocol", &self.protocol)
            .field("domain", &self.domain)
            .field("max_retries", &self.max_retries)
            .field("read_retry_timeout_secs", &self.read_retry_timeout_secs)
            .field("write_retry_timeout_secs", &self.write_retry_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup (environment-shaped).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.merge_lookup(lookup);
        config
    }

    /// Fill fields left empty by the provider block from the lookup.
    pub fn merge_env(&mut self) {
        self.merge_lookup(|key| std::env::var(key).ok());
    }

    fn merge_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.secret_id.is_empty() {
            if let Some(v) = non_empty(ENV_SECRET_ID) {
                self.secret_id = v;
            }
        }
        if self.secret_key.is_empty() {
            if let Some(v) = non_empty(ENV_SECRET_KEY) {
                self.secret_key = v;
            }
        }
        if self.security_token.is_none() {
            self.security_token = non_empty(ENV_SECURITY_TOKEN);
        }
        if let Some(v) = non_empty(ENV_REGION) {
            if self.region == DEFAULT_REGION {
                self.region = v;
            }
        }
        if let Some(v) = non_empty(ENV_PROTOCOL) {
            match Protocol::parse(&v) {
                Some(p) => self.protocol = p,
                None => log::warn!("Ignoring {ENV_PROTOCOL}={v}, expected HTTP or HTTPS"),
            }
        }
        if let Some(v) = non_empty(ENV_DOMAIN) {
            if self.domain == DEFAULT_DOMAIN {
                self.domain = v;
            }
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[must_use]
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn with_retry_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_retry_timeout_secs = read.as_secs();
        self.write_retry_timeout_secs = write.as_secs();
        self
    }

    /// Check that credentials are present before any request is signed.
    pub fn validate(&self) -> Result<()> {
        let mut diagnostics = Vec::new();
        if self.secret_id.trim().is_empty() {
            diagnostics.push(format!("secret_id: required (or set {ENV_SECRET_ID})"));
        }
        if self.secret_key.trim().is_empty() {
            diagnostics.push(format!("secret_key: required (or set {ENV_SECRET_KEY})"));
        }
        if self.domain.trim().is_empty() {
            diagnostics.push("domain: must not be empty".to_string());
        }
        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Validation {
                resource: "provider".to_string(),
                diagnostics,
            })
        }
    }

    /// `<service>.<domain>`, e.g. `teo.tencentcloudapi.com`.
    pub fn endpoint_host(&self, service: &str) -> String {
        format!("{service}.{}", self.domain)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            read_timeout: Duration::from_secs(self.read_retry_timeout_secs),
            write_timeout: Duration::from_secs(self.write_retry_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.region, "ap-guangzhou");
        assert_eq!(config.protocol, Protocol::Https);
        assert_eq!(config.endpoint_host("teo"), "teo.tencentcloudapi.com");
        assert_eq!(config.retry_policy().read_timeout, Duration::from_secs(180));
        assert_eq!(config.retry_policy().write_timeout, Duration::from_secs(300));
    }

    #[test]
    fn from_lookup_reads_env_names() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("TENCENTCLOUD_SECRET_ID", "AKID123"),
            ("TENCENTCLOUD_SECRET_KEY", "key"),
            ("TENCENTCLOUD_SECURITY_TOKEN", "token"),
            ("TENCENTCLOUD_REGION", "ap-singapore"),
            ("TENCENTCLOUD_PROTOCOL", "http"),
            ("TENCENTCLOUD_DOMAIN", "internal.tencentcloudapi.com"),
        ]));
        assert_eq!(config.secret_id, "AKID123");
        assert_eq!(config.secret_key, "key");
        assert_eq!(config.security_token.as_deref(), Some("token"));
        assert_eq!(config.region, "ap-singapore");
        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(
            config.endpoint_host("teo"),
            "teo.internal.tencentcloudapi.com"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_values_win_over_env() {
        let mut config: ProviderConfig =
            serde_json::from_str(r#"{"secret_id":"explicit","secret_key":"k"}"#)
                .unwrap_or_default();
        config.merge_lookup(lookup(&[("TENCENTCLOUD_SECRET_ID", "from-env")]));
        assert_eq!(config.secret_id, "explicit");
    }

    #[test]
    fn unknown_protocol_is_ignored() {
        let config = ProviderConfig::from_lookup(lookup(&[("TENCENTCLOUD_PROTOCOL", "ftp")]));
        assert_eq!(config.protocol, Protocol::Https);
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let err = ProviderConfig::default().validate().err();
        match err {
            Some(ProviderError::Validation { diagnostics, .. }) => {
                assert_eq!(diagnostics.len(), 2);
                assert!(diagnostics[0].starts_with("secret_id"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = ProviderConfig::new("id", "very-secret").with_security_token("tok");
        let printed = format!("{config:?}");
        assert!(!printed.contains("very-secret"));
        assert!(!printed.contains("tok\""));
    }

    #[test]
    fn serialization_skips_secrets() {
        let config = ProviderConfig::new("id", "very-secret");
        let json = serde_json::to_string(&config).unwrap_or_default();
        assert!(!json.contains("very-secret"));
        assert!(json.contains("\"protocol\":\"HTTPS\""));
    }
}
