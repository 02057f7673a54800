//! EdgeOne (`teo` 2022-09-01) API model

use serde::{Deserialize, Serialize};

// ============ 通用结构 ============

/// `AdvancedFilter`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdvancedFilter {
    pub name: String,
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy: Option<bool>,
}

impl AdvancedFilter {
    pub fn exact(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            values: vec![value.to_string()],
            fuzzy: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub tag_key: String,
    pub tag_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrivateParameter {
    pub name: String,
    pub value: String,
}

// ============ 站点 ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Zone {
    pub zone_id: Option<String>,
    pub zone_name: Option<String>,
    pub alias_zone_name: Option<String>,
    pub area: Option<String>,
    #[serde(rename = "Type")]
    pub zone_type: Option<String>,
    pub status: Option<String>,
    pub active_status: Option<String>,
    pub cname_status: Option<String>,
    pub paused: Option<bool>,
    pub name_servers: Option<Vec<String>>,
    pub tags: Option<Vec<Tag>>,
    pub resources: Option<Vec<ZonePlan>>,
    pub ownership_verification: Option<OwnershipVerification>,
    pub created_on: Option<String>,
    pub modified_on: Option<String>,
}

/// Plan bound to a zone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ZonePlan {
    pub id: Option<String>,
    pub plan_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OwnershipVerification {
    pub dns_verification: Option<DnsVerification>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsVerification {
    pub subdomain: Option<String>,
    pub record_type: Option<String>,
    pub record_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateZoneRequest {
    #[serde(rename = "Type")]
    pub zone_type: String,
    pub zone_name: String,
    pub area: String,
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_zone_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyZoneRequest {
    pub zone_id: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_zone_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

// ============ DNS 记录 ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing)]
    pub status: Option<String>,
    #[serde(skip_serializing)]
    pub created_on: Option<String>,
    #[serde(skip_serializing)]
    pub modified_on: Option<String>,
}

// ============ 源站组 ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub record: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_parameters: Option<Vec<PrivateParameter>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginGroupReference {
    pub instance_type: Option<String>,
    pub instance_id: Option<String>,
    pub instance_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginGroup {
    pub group_id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub group_type: Option<String>,
    pub records: Option<Vec<OriginRecord>>,
    pub references: Option<Vec<OriginGroupReference>>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub host_header: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginGroupRequest {
    pub zone_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub name: String,
    #[serde(rename = "Type")]
    pub group_type: String,
    pub records: Vec<OriginRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_header: Option<String>,
}

// ============ 加速域名 ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginInfo {
    pub origin_type: String,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_parameters: Option<Vec<PrivateParameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vod_origin_scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vod_bucket_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccelerationDomain {
    pub zone_id: Option<String>,
    pub domain_name: Option<String>,
    pub domain_status: Option<String>,
    pub origin_detail: Option<OriginInfo>,
    pub origin_protocol: Option<String>,
    pub http_origin_port: Option<i64>,
    pub https_origin_port: Option<i64>,
    #[serde(rename = "IPv6Status")]
    pub ipv6_status: Option<String>,
    pub cname: Option<String>,
    pub created_on: Option<String>,
    pub modified_on: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccelerationDomainRequest {
    pub zone_id: String,
    pub domain_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_info: Option<OriginInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_origin_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_origin_port: Option<i64>,
    #[serde(rename = "IPv6Status", skip_serializing_if = "Option::is_none")]
    pub ipv6_status: Option<String>,
}

// ============ 四层代理转发规则 ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct L4ProxyRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_value: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_port_range: Option<String>,
    #[serde(rename = "ClientIPPassThroughMode", skip_serializing_if = "Option::is_none")]
    pub client_ip_pass_through_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_persist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_persist_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_tag: Option<String>,
    /// 仅出参；作为入参时不能设置
    #[serde(skip_serializing)]
    pub status: Option<String>,
}

// ============ 源站防护 ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Addresses {
    #[serde(rename = "IPv4")]
    pub ipv4: Option<Vec<String>>,
    #[serde(rename = "IPv6")]
    pub ipv6: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrentOriginAcl {
    pub entire_addresses: Option<Addresses>,
    pub version: Option<String>,
    pub active_time: Option<String>,
    pub is_planed: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NextOriginAcl {
    pub version: Option<String>,
    pub planned_active_time: Option<String>,
    pub entire_addresses: Option<Addresses>,
    pub added_addresses: Option<Addresses>,
    pub removed_addresses: Option<Addresses>,
    pub no_change_addresses: Option<Addresses>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginAclInfo {
    pub l7_hosts: Option<Vec<String>>,
    pub l4_proxy_ids: Option<Vec<String>>,
    #[serde(rename = "CurrentOriginACL")]
    pub current_origin_acl: Option<CurrentOriginAcl>,
    #[serde(rename = "NextOriginACL")]
    pub next_origin_acl: Option<NextOriginAcl>,
    pub status: Option<String>,
}

/// One entry of `ModifyOriginACL.OriginACLEntities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginAclEntity {
    #[serde(rename = "Type")]
    pub entity_type: String,
    pub instances: Vec<String>,
    pub operation_mode: String,
}

// ============ IP 组 ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    pub name: String,
    pub content: Vec<String>,
}

// ============ 规则引擎 ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleCondition {
    pub operator: Option<String>,
    pub target: Option<String>,
    pub values: Option<Vec<String>>,
}

/// Conditions that must all hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleAndConditions {
    pub conditions: Option<Vec<RuleCondition>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleNormalActionParams {
    pub name: Option<String>,
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleRewriteActionParams {
    pub action: Option<String>,
    pub name: Option<String>,
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleCodeActionParams {
    pub name: Option<String>,
    pub values: Option<Vec<String>>,
    pub status_code: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NormalAction {
    pub action: Option<String>,
    pub parameters: Option<Vec<RuleNormalActionParams>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RewriteAction {
    pub action: Option<String>,
    pub parameters: Option<Vec<RuleRewriteActionParams>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeAction {
    pub action: Option<String>,
    pub parameters: Option<Vec<RuleCodeActionParams>>,
}

/// Exactly one of the three actions is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_action: Option<NormalAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite_action: Option<RewriteAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_action: Option<CodeAction>,
}

/// One rule: any of `conditions` triggers all `actions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rule {
    pub conditions: Option<Vec<RuleAndConditions>>,
    pub actions: Option<Vec<RuleAction>>,
}

/// `DescribeRules` item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleItem {
    pub rule_id: Option<String>,
    pub rule_name: Option<String>,
    pub status: Option<String>,
    pub rules: Option<Vec<Rule>>,
    pub rule_priority: Option<i64>,
}
