//! EdgeOne resources.
//!
//! Each resource is a schema plus four handlers. Request shaping lives in
//! `expand_*` functions and response flattening in `flatten_*`, both plain
//! functions over the attribute bag so they can be tested without a transport.

mod acceleration_domain;
mod dns_record;
mod l4_proxy_rule;
mod origin_acl;
mod origin_group;
mod rule_engine;
mod security_ip_group;
mod security_policy_config;
mod zone;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::resource_data::{ResourceData, string_list};
use crate::services::teo::TeoService;
use crate::services::teo::types::PrivateParameter;
use crate::traits::Resource;

pub use acceleration_domain::AccelerationDomainResource;
pub use dns_record::DnsRecordResource;
pub use l4_proxy_rule::L4ProxyRuleResource;
pub use origin_acl::OriginAclResource;
pub use origin_group::OriginGroupResource;
pub use rule_engine::RuleEngineResource;
pub use security_ip_group::SecurityIpGroupResource;
pub use security_policy_config::SecurityPolicyConfigResource;
pub use zone::ZoneResource;

/// Every resource backed by `service`.
pub fn all(service: &TeoService) -> Vec<Arc<dyn Resource>> {
    vec![
        Arc::new(ZoneResource::new(service.clone())),
        Arc::new(DnsRecordResource::new(service.clone())),
        Arc::new(OriginGroupResource::new(service.clone())),
        Arc::new(AccelerationDomainResource::new(service.clone())),
        Arc::new(L4ProxyRuleResource::new(service.clone())),
        Arc::new(OriginAclResource::new(service.clone())),
        Arc::new(SecurityIpGroupResource::new(service.clone())),
        Arc::new(SecurityPolicyConfigResource::new(service.clone())),
        Arc::new(RuleEngineResource::new(service.clone())),
    ]
}

/// The remote object vanished: drop it from state.
pub(crate) fn mark_gone(d: &mut ResourceData, resource: &str) {
    log::warn!(
        "[WARN] resource `{resource}` [{}] not found, please check if it has been deleted.",
        d.id()
    );
    d.set_id("");
}

// ============ 嵌套块读取 ============

pub(crate) fn map_str<'a>(m: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    m.get(key).and_then(Value::as_str)
}

/// Non-empty string.
pub(crate) fn map_ok_str(m: &Map<String, Value>, key: &str) -> Option<String> {
    map_str(m, key).filter(|s| !s.is_empty()).map(str::to_string)
}

pub(crate) fn map_i64(m: &Map<String, Value>, key: &str) -> Option<i64> {
    m.get(key).and_then(Value::as_i64)
}

/// Non-zero integer.
pub(crate) fn map_ok_i64(m: &Map<String, Value>, key: &str) -> Option<i64> {
    map_i64(m, key).filter(|v| *v != 0)
}

pub(crate) fn map_bool(m: &Map<String, Value>, key: &str) -> Option<bool> {
    m.get(key).and_then(Value::as_bool)
}

pub(crate) fn map_strings(m: &Map<String, Value>, key: &str) -> Vec<String> {
    m.get(key)
        .and_then(Value::as_array)
        .map(|items| string_list(items))
        .unwrap_or_default()
}

pub(crate) fn map_objects<'a>(m: &'a Map<String, Value>, key: &str) -> Vec<&'a Map<String, Value>> {
    m.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

// ============ 私有鉴权参数 ============

pub(crate) fn expand_private_parameters(m: &Map<String, Value>) -> Option<Vec<PrivateParameter>> {
    let params: Vec<PrivateParameter> = map_objects(m, "private_parameters")
        .into_iter()
        .map(|p| PrivateParameter {
            name: map_str(p, "name").unwrap_or_default().to_string(),
            value: map_str(p, "value").unwrap_or_default().to_string(),
        })
        .collect();
    (!params.is_empty()).then_some(params)
}

pub(crate) fn flatten_private_parameters(params: &[PrivateParameter]) -> Value {
    params
        .iter()
        .map(|p| serde_json::json!({"name": p.name, "value": p.value}))
        .collect()
}

/// Schema of a `private_parameters` entry.
pub(crate) fn private_parameter_schema() -> crate::schema::Schema {
    use crate::schema::{Attribute, Schema};
    Schema::new()
        .attr(
            "name",
            Attribute::string()
                .required()
                .describe("Private authentication parameter name: AccessKeyId, SecretAccessKey, SignatureVersion or Region."),
        )
        .attr(
            "value",
            Attribute::string()
                .required()
                .sensitive()
                .describe("Private authentication parameter value."),
        )
}

/// Value list as JSON, `None` when the API returned nothing.
pub(crate) fn strings_value(items: Option<&Vec<String>>) -> Option<Value> {
    items.map(|v| Value::from(v.clone()))
}
