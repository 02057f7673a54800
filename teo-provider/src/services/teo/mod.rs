//! EdgeOne service: typed calls, paged lookups by ID and status waiters.

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::{ProviderError, Result};
use crate::retry::{RetryError, RetryPolicy, StateWait, retry_with_timeout, wait_for_state};
use crate::traits::ApiTransport;
use crate::utils::log_sanitizer::body_for_log;

use types::{
    AccelerationDomain, AdvancedFilter, DnsRecord, IpGroup, L4ProxyRule, OriginAclInfo,
    OriginGroup, RuleItem, Zone,
};

/// 单页查询条数
const ZONE_PAGE_SIZE: u64 = 100;
const DEFAULT_PAGE_SIZE: u64 = 20;

/// Shared handle used by every TEO resource and data source.
#[derive(Clone)]
pub struct TeoService {
    transport: Arc<dyn ApiTransport>,
    policy: RetryPolicy,
}

impl TeoService {
    pub fn new(transport: Arc<dyn ApiTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Single attempt of `action`.
    pub async fn call<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_value(request).map_err(|e| ProviderError::SerializationError {
            action: action.to_string(),
            detail: e.to_string(),
        })?;
        let response = self.transport.call(action, payload.clone()).await?;
        log::debug!(
            "api[{action}] success, request body [{}], response body [{}]",
            body_for_log(&payload),
            body_for_log(&response)
        );
        serde_json::from_value(response).map_err(|e| ProviderError::ParseError {
            action: action.to_string(),
            detail: e.to_string(),
        })
    }

    /// `action` retried within the read window.
    pub async fn read<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        retry_with_timeout(action, self.policy.read_timeout, move || async move {
            self.call(action, request).await.map_err(RetryError::classify)
        })
        .await
    }

    /// `action` retried within the write window.
    pub async fn write<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        retry_with_timeout(action, self.policy.write_timeout, move || async move {
            self.call(action, request).await.map_err(RetryError::classify)
        })
        .await
    }

    /// Write whose response body is not needed.
    pub async fn execute<Req>(&self, action: &str, request: &Req) -> Result<()>
    where
        Req: Serialize + ?Sized + Sync,
    {
        self.write::<Req, Value>(action, request).await.map(|_| ())
    }

    /// Page through `action` (`Offset`/`Limit`) collecting `items_key`.
    async fn read_all<T>(
        &self,
        action: &str,
        mut request: Map<String, Value>,
        items_key: &str,
        page_size: u64,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut offset = 0_u64;
        loop {
            request.insert("Offset".to_string(), json!(offset));
            request.insert("Limit".to_string(), json!(page_size));

            let mut response: Map<String, Value> = self.read(action, &request).await?;
            let page: Vec<T> = match response.remove(items_key) {
                Some(Value::Null) | None => Vec::new(),
                Some(v) => serde_json::from_value(v).map_err(|e| ProviderError::ParseError {
                    action: action.to_string(),
                    detail: e.to_string(),
                })?,
            };

            let count = page.len() as u64;
            items.extend(page);
            if count < page_size {
                break;
            }
            offset += count;
        }
        Ok(items)
    }

    // ============ 站点 ============

    pub async fn describe_zone(&self, zone_id: &str) -> Result<Option<Zone>> {
        let zones = self
            .describe_zones(vec![AdvancedFilter::exact("zone-id", zone_id)], None, None)
            .await?;
        Ok(zones.into_iter().next())
    }

    pub async fn describe_zones(
        &self,
        filters: Vec<AdvancedFilter>,
        order: Option<String>,
        direction: Option<String>,
    ) -> Result<Vec<Zone>> {
        let mut request = Map::new();
        if !filters.is_empty() {
            request.insert("Filters".to_string(), json!(filters));
        }
        if let Some(order) = order {
            request.insert("Order".to_string(), json!(order));
        }
        if let Some(direction) = direction {
            request.insert("Direction".to_string(), json!(direction));
        }
        self.read_all("DescribeZones", request, "Zones", ZONE_PAGE_SIZE)
            .await
    }

    /// Pause or resume a zone and wait for its `ActiveStatus` to settle.
    ///
    /// Deleting requires `paused`; otherwise `inactive` is accepted as well.
    pub async fn modify_zone_status(&self, zone_id: &str, paused: bool, for_delete: bool) -> Result<()> {
        self.execute("ModifyZoneStatus", &json!({"ZoneId": zone_id, "Paused": paused}))
            .await?;

        let target: &[&str] = match (paused, for_delete) {
            (true, true) => &["paused"],
            (true, false) => &["paused", "inactive"],
            (false, _) => &["active", "inactive", "pending"],
        };
        let wait = StateWait::new("ModifyZoneStatus", self.policy.read_timeout * 6, target)
            .interval(Duration::from_secs(5));
        wait_for_state(wait, move || async move {
            Ok(self
                .describe_zone(zone_id)
                .await?
                .and_then(|zone| zone.active_status))
        })
        .await
        .map(|_| ())
    }

    // ============ DNS 记录 ============

    pub async fn describe_dns_record(&self, zone_id: &str, record_id: &str) -> Result<Option<DnsRecord>> {
        let request = json!({
            "ZoneId": zone_id,
            "Filters": [AdvancedFilter::exact("id", record_id)],
        });
        let mut response: Map<String, Value> = self.read("DescribeDnsRecords", &request).await?;
        let records: Vec<DnsRecord> = match response.remove("DnsRecords") {
            Some(Value::Null) | None => Vec::new(),
            Some(v) => serde_json::from_value(v).map_err(|e| ProviderError::ParseError {
                action: "DescribeDnsRecords".to_string(),
                detail: e.to_string(),
            })?,
        };
        Ok(records.into_iter().next())
    }

    // ============ 源站组 ============

    pub async fn describe_origin_group(&self, zone_id: &str, group_id: &str) -> Result<Option<OriginGroup>> {
        let mut request = Map::new();
        request.insert("ZoneId".to_string(), json!(zone_id));
        request.insert(
            "Filters".to_string(),
            json!([AdvancedFilter::exact("origin-group-id", group_id)]),
        );
        let groups: Vec<OriginGroup> = self
            .read_all("DescribeOriginGroup", request, "OriginGroups", DEFAULT_PAGE_SIZE)
            .await?;
        Ok(groups
            .into_iter()
            .find(|g| g.group_id.as_deref() == Some(group_id)))
    }

    // ============ 加速域名 ============

    pub async fn describe_acceleration_domain(
        &self,
        zone_id: &str,
        domain_name: &str,
    ) -> Result<Option<AccelerationDomain>> {
        let mut request = Map::new();
        request.insert("ZoneId".to_string(), json!(zone_id));
        request.insert(
            "Filters".to_string(),
            json!([AdvancedFilter::exact("domain-name", domain_name)]),
        );
        let domains: Vec<AccelerationDomain> = self
            .read_all(
                "DescribeAccelerationDomains",
                request,
                "AccelerationDomains",
                DEFAULT_PAGE_SIZE,
            )
            .await?;
        Ok(domains
            .into_iter()
            .find(|d| d.domain_name.as_deref() == Some(domain_name)))
    }

    /// Wait until the domain reports `status` (`online` or `offline`).
    pub async fn wait_acceleration_domain_status(
        &self,
        zone_id: &str,
        domain_name: &str,
        status: &str,
    ) -> Result<()> {
        let target = [status];
        let wait = StateWait::new(
            "DescribeAccelerationDomains",
            self.policy.read_timeout * 6,
            &target,
        );
        wait_for_state(wait, move || async move {
            Ok(self
                .describe_acceleration_domain(zone_id, domain_name)
                .await?
                .and_then(|d| d.domain_status))
        })
        .await
        .map(|_| ())
    }

    // ============ 四层代理转发规则 ============

    pub async fn describe_l4_proxy_rule(
        &self,
        zone_id: &str,
        proxy_id: &str,
        rule_id: &str,
    ) -> Result<Option<L4ProxyRule>> {
        let mut request = Map::new();
        request.insert("ZoneId".to_string(), json!(zone_id));
        request.insert("ProxyId".to_string(), json!(proxy_id));
        request.insert(
            "Filters".to_string(),
            json!([AdvancedFilter::exact("rule-id", rule_id)]),
        );
        let rules: Vec<L4ProxyRule> = self
            .read_all("DescribeL4ProxyRules", request, "L4ProxyRules", DEFAULT_PAGE_SIZE)
            .await?;
        Ok(rules
            .into_iter()
            .find(|r| r.rule_id.as_deref() == Some(rule_id)))
    }

    /// Wait for a rule deployment to reach `status`; `fail` aborts immediately.
    pub async fn wait_l4_proxy_rule_status(
        &self,
        zone_id: &str,
        proxy_id: &str,
        rule_id: &str,
        status: &str,
    ) -> Result<()> {
        let target = [status];
        let wait = StateWait::new("DescribeL4ProxyRules", self.policy.read_timeout * 10, &target)
            .fail_on(&["fail"])
            .interval(Duration::from_secs(1));
        wait_for_state(wait, move || async move {
            Ok(self
                .describe_l4_proxy_rule(zone_id, proxy_id, rule_id)
                .await?
                .and_then(|r| r.status))
        })
        .await
        .map(|_| ())
    }

    // ============ 源站防护 ============

    pub async fn describe_origin_acl(&self, zone_id: &str) -> Result<Option<OriginAclInfo>> {
        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(rename = "OriginACLInfo")]
            origin_acl_info: Option<OriginAclInfo>,
        }

        let response: Response = self
            .read("DescribeOriginACL", &json!({"ZoneId": zone_id}))
            .await?;
        Ok(response.origin_acl_info)
    }

    pub async fn wait_origin_acl_status(&self, zone_id: &str, status: &str) -> Result<()> {
        let target = [status];
        let wait = StateWait::new("DescribeOriginACL", self.policy.write_timeout * 2, &target)
            .interval(Duration::from_secs(5));
        wait_for_state(wait, move || async move {
            match self.describe_origin_acl(zone_id).await? {
                Some(info) => Ok(info.status),
                None => Err(ProviderError::UnexpectedState {
                    operation: "DescribeOriginACL".to_string(),
                    state: "missing OriginACLInfo".to_string(),
                }),
            }
        })
        .await
        .map(|_| ())
    }

    // ============ IP 组 ============

    pub async fn describe_security_ip_group(&self, zone_id: &str, group_id: i64) -> Result<Option<IpGroup>> {
        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(rename = "IPGroups")]
            ip_groups: Option<Vec<IpGroup>>,
        }

        let response: Response = self
            .read(
                "DescribeSecurityIPGroup",
                &json!({"ZoneId": zone_id, "GroupIds": [group_id]}),
            )
            .await?;
        Ok(response
            .ip_groups
            .unwrap_or_default()
            .into_iter()
            .find(|g| g.group_id == Some(group_id)))
    }

    // ============ 规则引擎 ============

    pub async fn describe_rule_engine(&self, zone_id: &str, rule_id: &str) -> Result<Option<RuleItem>> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct Response {
            rule_items: Option<Vec<RuleItem>>,
        }

        let response: Response = self
            .read(
                "DescribeRules",
                &json!({"ZoneId": zone_id, "Filters": [AdvancedFilter::exact("rule-id", rule_id)]}),
            )
            .await?;
        Ok(response
            .rule_items
            .unwrap_or_default()
            .into_iter()
            .find(|r| r.rule_id.as_deref() == Some(rule_id)))
    }

    // ============ Web 防护策略 ============

    /// Security policy of a zone default, host or template entity.
    ///
    /// The policy is returned as raw JSON; its shape follows the resource
    /// schema and is converted there.
    pub async fn describe_security_policy(
        &self,
        zone_id: &str,
        entity: &str,
        host: Option<&str>,
        template_id: Option<&str>,
    ) -> Result<Option<Map<String, Value>>> {
        let mut request = Map::new();
        request.insert("ZoneId".to_string(), json!(zone_id));
        request.insert("Entity".to_string(), json!(entity));
        if let Some(host) = host {
            request.insert("Host".to_string(), json!(host));
        }
        if let Some(template_id) = template_id {
            request.insert("TemplateId".to_string(), json!(template_id));
        }

        let mut response: Map<String, Value> = self.read("DescribeSecurityPolicy", &request).await?;
        Ok(match response.remove("SecurityPolicy") {
            Some(Value::Object(policy)) => Some(policy),
            _ => None,
        })
    }
}
