//! # teo-provider
//!
//! Declarative resources and data sources for
//! [Tencent Cloud EdgeOne](https://cloud.tencent.com/product/teo) (TEO).
//!
//! Every object is described by a [`Schema`] and driven through a
//! create/read/update/delete/import lifecycle by [`TeoProvider`]. Requests are
//! signed with TC3-HMAC-SHA256 against the `teo` service, API version
//! `2022-09-01`.
//!
//! ## Resources
//!
//! | Type name | Remote object | ID |
//! |-----------|---------------|----|
//! | `tencentcloud_teo_zone` | Site | `zone_id` |
//! | `tencentcloud_teo_dns_record` | DNS record | `zone_id#record_id` |
//! | `tencentcloud_teo_origin_group` | Origin group | `zone_id#group_id` |
//! | `tencentcloud_teo_acceleration_domain` | Acceleration domain | `zone_id#domain_name` |
//! | `tencentcloud_teo_l4_proxy_rule` | L4 proxy forwarding rule | `zone_id#proxy_id#rule_id` |
//! | `tencentcloud_teo_origin_acl` | Origin protection | `zone_id` |
//! | `tencentcloud_teo_security_ip_group` | Security IP group | `zone_id#group_id` |
//! | `tencentcloud_teo_security_policy_config` | Web protection policy | `zone_id#ZoneDefaultPolicy`, `zone_id#Host#host` or `zone_id#Template#template_id` |
//! | `tencentcloud_teo_rule_engine` | Rule engine rule | `zone_id#rule_id` |
//!
//! Data sources: `tencentcloud_teo_zones`, `tencentcloud_teo_origin_acl`.
//!
//! ## Feature Flags
//!
//! - **`native-tls`** *(default)*: use the platform's native TLS implementation.
//! - **`rustls`**: use rustls.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde_json::json;
//! use teo_provider::{ProviderConfig, TeoProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // TENCENTCLOUD_SECRET_ID / TENCENTCLOUD_SECRET_KEY
//!     let provider = TeoProvider::new(ProviderConfig::from_env())?;
//!
//!     let config = json!({
//!         "zone_id": "zone-2o0i41pv2h8c",
//!         "name": "www",
//!         "type": "A",
//!         "content": "1.2.3.4",
//!     });
//!     let state = provider
//!         .create(
//!             "tencentcloud_teo_dns_record",
//!             config.as_object().cloned().unwrap_or_default(),
//!         )
//!         .await?;
//!     println!("created {}", state["id"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, ProviderError>`](ProviderError).
//! Transient API failures (`InternalError`, `RequestLimitExceeded`,
//! `FailedOperation`...) are retried inside a bounded window, see [`retry`].
//! Use [`ProviderError::is_expected`] to tell user-side errors from remote
//! failures.

pub mod client;
mod config;
mod data_sources;
mod error;
mod hash;
mod http_client;
mod provider;
mod resource_data;
mod resources;
pub mod retry;
mod schema;
pub mod services;
mod traits;
mod utils;

#[cfg(test)]
mod test_support;

pub use config::{
    DEFAULT_DOMAIN, DEFAULT_REGION, ENV_DOMAIN, ENV_PROTOCOL, ENV_REGION, ENV_SECRET_ID,
    ENV_SECRET_KEY, ENV_SECURITY_TOKEN, Protocol, ProviderConfig,
};
pub use error::{ProviderError, Result};
pub use hash::{hash_string, ids_hash, origin_record_hash};
pub use provider::{ProviderSchema, State, TeoProvider};
pub use resource_data::{ID_SEPARATOR, ResourceData, build_id, split_id};
pub use retry::RetryPolicy;
pub use schema::{AttrType, Attribute, Schema, Validator};
pub use traits::{ApiTransport, DataSource, Resource};

pub use data_sources::{OriginAclDataSource, ZonesDataSource};
pub use resources::{
    AccelerationDomainResource, DnsRecordResource, L4ProxyRuleResource, OriginAclResource,
    OriginGroupResource, RuleEngineResource, SecurityIpGroupResource,
    SecurityPolicyConfigResource, ZoneResource,
};
