//! Provider registry and lifecycle entry points.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::TencentCloudClient;
use crate::config::ProviderConfig;
use crate::data_sources;
use crate::error::{ProviderError, Result};
use crate::resource_data::ResourceData;
use crate::resources;
use crate::retry::RetryPolicy;
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::traits::{ApiTransport, DataSource, Resource};
use crate::utils::elapsed::{Elapsed, log_id};

/// Attribute bag handed to and returned from the lifecycle methods.
pub type State = Map<String, Value>;

/// Serializable description of everything the provider offers.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<&'static str, Schema>,
    pub data_sources: BTreeMap<&'static str, Schema>,
}

/// EdgeOne provider: resources and data sources keyed by type name.
pub struct TeoProvider {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl TeoProvider {
    /// Build the signed client from `config` and register everything.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = TencentCloudClient::teo(&config)?;
        log::info!(
            "teo provider configured, endpoint [{}], region [{}]",
            client.endpoint(),
            config.region
        );
        Ok(Self::with_transport(Arc::new(client), config.retry_policy()))
    }

    /// Provider on top of an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn ApiTransport>, policy: RetryPolicy) -> Self {
        let service = TeoService::new(transport, policy);
        Self {
            resources: resources::all(&service)
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: data_sources::all(&service)
                .into_iter()
                .map(|s| (s.type_name(), s))
                .collect(),
        }
    }

    pub fn resource(&self, type_name: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(type_name).cloned()
    }

    pub fn data_source(&self, type_name: &str) -> Option<Arc<dyn DataSource>> {
        self.data_sources.get(type_name).cloned()
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn data_source_types(&self) -> Vec<&'static str> {
        self.data_sources.keys().copied().collect()
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: provider_config_schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| (*name, r.schema()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, s)| (*name, s.schema()))
                .collect(),
        }
    }

    // ============ 生命周期 ============

    /// Create a resource from `config`, returning its state.
    ///
    /// When the remote object exists but a later step fails (waiting, status
    /// change, read-back), the error is [`ProviderError::PartiallyCreated`]
    /// and carries the state to keep.
    pub async fn create(&self, type_name: &str, config: State) -> Result<State> {
        let resource = self.lookup_resource(type_name)?;
        let schema = resource.schema();
        validate(type_name, &schema, &config)?;

        let log = log_id();
        let _elapsed = Elapsed::new(format!("{type_name}.create"), &log);
        let mut d = ResourceData::from_config(&schema, config);
        if let Err(e) = logged(&log, type_name, "create", resource.create(&mut d).await) {
            let id = d.id().to_string();
            return Err(match d.into_state(&schema) {
                Some(state) => ProviderError::PartiallyCreated {
                    resource: type_name.to_string(),
                    id,
                    state,
                    source: Box::new(e),
                },
                None => e,
            });
        }

        d.into_state(&schema).ok_or_else(|| ProviderError::UnexpectedState {
            operation: format!("{type_name}.create"),
            state: "resource not found after creation".to_string(),
        })
    }

    /// Refresh stored state. `None` means the remote object is gone.
    pub async fn read(&self, type_name: &str, id: &str, state: State) -> Result<Option<State>> {
        let resource = self.lookup_resource(type_name)?;
        let schema = resource.schema();

        let log = log_id();
        let _elapsed = Elapsed::new(format!("{type_name}.read"), &log);
        let mut d = ResourceData::from_state(&schema, id, state);
        logged(&log, type_name, "read", resource.read(&mut d).await)?;
        Ok(d.into_state(&schema))
    }

    /// Move a resource from `prior` state to `config`.
    ///
    /// A change to a force-new argument is refused; the host is expected to
    /// replace the resource instead.
    pub async fn update(&self, type_name: &str, id: &str, prior: State, config: State) -> Result<Option<State>> {
        let resource = self.lookup_resource(type_name)?;
        let schema = resource.schema();
        validate(type_name, &schema, &config)?;

        let log = log_id();
        let _elapsed = Elapsed::new(format!("{type_name}.update"), &log);
        let mut d = ResourceData::for_update(&schema, id, prior, config);
        d.ensure_unchanged(type_name, &schema.force_new_attributes())?;
        logged(&log, type_name, "update", resource.update(&mut d).await)?;
        Ok(d.into_state(&schema))
    }

    pub async fn delete(&self, type_name: &str, id: &str, state: State) -> Result<()> {
        let resource = self.lookup_resource(type_name)?;
        let schema = resource.schema();

        let log = log_id();
        let _elapsed = Elapsed::new(format!("{type_name}.delete"), &log);
        let mut d = ResourceData::from_state(&schema, id, state);
        logged(&log, type_name, "delete", resource.delete(&mut d).await)
    }

    /// Import an existing remote object by ID.
    pub async fn import(&self, type_name: &str, id: &str) -> Result<State> {
        let resource = self.lookup_resource(type_name)?;
        let schema = resource.schema();

        let log = log_id();
        let _elapsed = Elapsed::new(format!("{type_name}.import"), &log);
        let mut d = ResourceData::with_id(id);
        logged(&log, type_name, "import", resource.import(&mut d).await)?;

        d.into_state(&schema).ok_or_else(|| ProviderError::ResourceNotFound {
            action: format!("{type_name}.import"),
            raw_code: "ResourceNotFound".to_string(),
            raw_message: format!("cannot import non-existent remote object [{id}]"),
        })
    }

    /// Evaluate a data source against `config`.
    pub async fn read_data_source(&self, type_name: &str, config: State) -> Result<State> {
        let source = self
            .data_source(type_name)
            .ok_or_else(|| unsupported(type_name, "data source"))?;
        let schema = source.schema();
        validate(type_name, &schema, &config)?;

        let log = log_id();
        let _elapsed = Elapsed::new(format!("{type_name}.read"), &log);
        let mut d = ResourceData::from_config(&schema, config);
        logged(&log, type_name, "read", source.read(&mut d).await)?;

        d.into_state(&schema).ok_or_else(|| ProviderError::UnexpectedState {
            operation: format!("{type_name}.read"),
            state: "data source produced no id".to_string(),
        })
    }

    fn lookup_resource(&self, type_name: &str) -> Result<Arc<dyn Resource>> {
        self.resource(type_name)
            .ok_or_else(|| unsupported(type_name, "resource"))
    }
}

fn unsupported(type_name: &str, kind: &str) -> ProviderError {
    ProviderError::Validation {
        resource: type_name.to_string(),
        diagnostics: vec![format!("unsupported {kind} type")],
    }
}

fn validate(type_name: &str, schema: &Schema, config: &State) -> Result<()> {
    let diagnostics = schema.validate(config);
    if diagnostics.is_empty() {
        return Ok(());
    }
    Err(ProviderError::Validation {
        resource: type_name.to_string(),
        diagnostics,
    })
}

/// Log the handler outcome at a level matching the error kind.
fn logged(log_id: &str, type_name: &str, op: &str, result: Result<()>) -> Result<()> {
    match &result {
        Ok(()) => log::debug!("{log_id} [{type_name}] {op} done"),
        Err(e) if e.is_expected() => log::warn!("{log_id} [{type_name}] {op} failed: {e}"),
        Err(e) => log::error!("[CRITAL]{log_id} [{type_name}] {op} failed: {e}"),
    }
    result
}

fn provider_config_schema() -> Schema {
    Schema::new()
        .attr(
            "secret_id",
            Attribute::string()
                .optional()
                .describe("Tencent Cloud SecretId, or TENCENTCLOUD_SECRET_ID."),
        )
        .attr(
            "secret_key",
            Attribute::string()
                .optional()
                .sensitive()
                .describe("Tencent Cloud SecretKey, or TENCENTCLOUD_SECRET_KEY."),
        )
        .attr(
            "security_token",
            Attribute::string()
                .optional()
                .sensitive()
                .describe("Temporary credential token, or TENCENTCLOUD_SECURITY_TOKEN."),
        )
        .attr(
            "region",
            Attribute::string()
                .optional()
                .describe("Region, or TENCENTCLOUD_REGION. `ap-guangzhou` by default."),
        )
        .attr(
            "protocol",
            Attribute::string()
                .optional()
                .validate(Validator::AllowedValues(&["HTTPS", "HTTP"]))
                .describe("API protocol, or TENCENTCLOUD_PROTOCOL. `HTTPS` by default."),
        )
        .attr(
            "domain",
            Attribute::string()
                .optional()
                .describe("API root domain, or TENCENTCLOUD_DOMAIN. `tencentcloudapi.com` by default."),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, object};
    use serde_json::json;

    fn provider(transport: Arc<Scripted>) -> TeoProvider {
        TeoProvider::with_transport(transport, RetryPolicy::default())
    }

    #[test]
    fn registry_lists_everything() {
        let p = provider(Arc::new(Scripted::default()));
        assert_eq!(
            p.resource_types(),
            vec![
                "tencentcloud_teo_acceleration_domain",
                "tencentcloud_teo_dns_record",
                "tencentcloud_teo_l4_proxy_rule",
                "tencentcloud_teo_origin_acl",
                "tencentcloud_teo_origin_group",
                "tencentcloud_teo_rule_engine",
                "tencentcloud_teo_security_ip_group",
                "tencentcloud_teo_security_policy_config",
                "tencentcloud_teo_zone",
            ]
        );
        assert_eq!(
            p.data_source_types(),
            vec!["tencentcloud_teo_origin_acl", "tencentcloud_teo_zones"]
        );
    }

    #[test]
    fn schema_serializes_with_sensitive_flags() {
        let p = provider(Arc::new(Scripted::default()));
        let v = serde_json::to_value(p.schema()).unwrap_or_default();
        assert_eq!(v["provider"]["attributes"]["secret_key"]["sensitive"], true);
        assert_eq!(
            v["resources"]["tencentcloud_teo_origin_group"]["attributes"]["zone_id"]["force_new"],
            true
        );
        assert!(v["data_sources"]["tencentcloud_teo_zones"].is_object());
    }

    #[test]
    fn new_requires_credentials() {
        assert!(matches!(
            TeoProvider::new(ProviderConfig::default()),
            Err(ProviderError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_config_never_reaches_the_api() {
        let transport = Arc::new(Scripted::default());
        let p = provider(transport.clone());
        let result = p
            .create(
                "tencentcloud_teo_dns_record",
                object(json!({"zone_id": "zone-1", "name": "www", "type": "PTR", "content": "x"})),
            )
            .await;
        assert!(
            matches!(&result, Err(ProviderError::Validation { diagnostics, .. }) if diagnostics.len() == 1),
            "{result:?}"
        );
        assert!(transport.actions().is_empty());
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let p = provider(Arc::new(Scripted::default()));
        let result = p.create("tencentcloud_teo_nope", Map::new()).await;
        assert!(matches!(result, Err(ProviderError::Validation { .. })));
    }

    #[tokio::test]
    async fn force_new_change_is_refused() {
        let transport = Arc::new(Scripted::default());
        let p = provider(transport.clone());
        let prior = object(json!({"zone_id": "zone-1", "name": "web", "type": "GENERAL", "records": [{"record": "1.1.1.1"}]}));
        let mut config = prior.clone();
        config.insert("zone_id".into(), json!("zone-2"));

        let result = p
            .update("tencentcloud_teo_origin_group", "zone-1#og-1", prior, config)
            .await;
        assert!(
            matches!(&result, Err(ProviderError::ImmutableArgument { argument, .. }) if argument == "zone_id"),
            "{result:?}"
        );
        assert!(transport.actions().is_empty());
    }

    #[tokio::test]
    async fn import_of_missing_object_fails() {
        let transport = Arc::new(Scripted::default().reply("DescribeZones", json!({"Zones": []})));
        let p = provider(transport);
        let result = p.import("tencentcloud_teo_zone", "zone-404").await;
        assert!(matches!(result, Err(ProviderError::ResourceNotFound { .. })));
    }

    #[tokio::test]
    async fn read_returns_state_with_id() {
        let transport = Arc::new(Scripted::default().reply(
            "DescribeOriginACL",
            json!({"OriginACLInfo": {"L7Hosts": ["a.com"], "L4ProxyIds": [], "Status": "online"}}),
        ));
        let p = provider(transport);
        let state = p
            .read("tencentcloud_teo_origin_acl", "zone-1", object(json!({"zone_id": "zone-1"})))
            .await;
        let state = state.ok().flatten().unwrap_or_default();
        assert_eq!(state.get("id"), Some(&json!("zone-1")));
        assert_eq!(state.get("l7_hosts"), Some(&json!(["a.com"])));
    }
}
