//! `tencentcloud_teo_l4_proxy_rule`

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::{ProviderError, Result};
use crate::resource_data::{ResourceData, build_id};
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::services::teo::types::L4ProxyRule;
use crate::traits::Resource;

use super::{map_ok_i64, map_ok_str, map_strings, mark_gone, strings_value};

const RESOURCE: &str = "tencentcloud_teo_l4_proxy_rule";

pub struct L4ProxyRuleResource {
    service: TeoService,
}

impl L4ProxyRuleResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn rule_schema() -> Schema {
    Schema::new()
        .attr("rule_id", Attribute::string().computed().describe("Forwarding rule ID."))
        .attr(
            "protocol",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["TCP", "UDP"]))
                .describe("Forwarding protocol, `TCP` by default."),
        )
        .attr(
            "port_range",
            Attribute::string_set()
                .optional()
                .describe("Listening ports or port ranges, e.g. `80` or `81-85`."),
        )
        .attr(
            "origin_type",
            Attribute::string()
                .optional()
                .validate(Validator::AllowedValues(&["IP_DOMAIN", "ORIGIN_GROUP", "LB"]))
                .describe("Origin type."),
        )
        .attr(
            "origin_value",
            Attribute::string_set()
                .optional()
                .describe("Origin addresses, or a single origin group / load balancer ID."),
        )
        .attr(
            "origin_port_range",
            Attribute::string()
                .optional()
                .describe("Origin port: a single port or a range matching `port_range` in length."),
        )
        .attr(
            "client_ip_pass_through_mode",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["TOA", "PPV1", "PPV2", "SPP", "OFF"]))
                .describe("How the client IP is passed to the origin."),
        )
        .attr(
            "session_persist",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["on", "off"]))
                .describe("Whether session persistence is enabled."),
        )
        .attr(
            "session_persist_time",
            Attribute::int()
                .optional()
                .computed()
                .validate(Validator::IntBetween(30, 3600))
                .describe("Session persistence time in seconds."),
        )
        .attr(
            "rule_tag",
            Attribute::string()
                .optional()
                .computed()
                .describe("Rule tag."),
        )
        .attr(
            "status",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["online", "offline"]))
                .describe("Rule status."),
        )
}

fn l4_proxy_rule_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().required().force_new().describe("Site ID."))
        .attr(
            "proxy_id",
            Attribute::string()
                .required()
                .force_new()
                .describe("Layer-4 proxy instance ID."),
        )
        .attr(
            "l4_proxy_rules",
            Attribute::block_list(rule_schema())
                .required()
                .max_items(1)
                .describe("The forwarding rule."),
        )
}

pub(crate) fn expand_l4_proxy_rule(m: &Map<String, Value>) -> L4ProxyRule {
    let non_empty = |key: &str| Some(map_strings(m, key)).filter(|v| !v.is_empty());
    L4ProxyRule {
        rule_id: map_ok_str(m, "rule_id"),
        protocol: map_ok_str(m, "protocol"),
        port_range: non_empty("port_range"),
        origin_type: map_ok_str(m, "origin_type"),
        origin_value: non_empty("origin_value"),
        origin_port_range: map_ok_str(m, "origin_port_range"),
        client_ip_pass_through_mode: map_ok_str(m, "client_ip_pass_through_mode"),
        session_persist: map_ok_str(m, "session_persist"),
        session_persist_time: map_ok_i64(m, "session_persist_time"),
        rule_tag: map_ok_str(m, "rule_tag"),
        status: None,
    }
}

pub(crate) fn flatten_l4_proxy_rule(rule: L4ProxyRule) -> Value {
    let mut m = Map::new();
    m.insert("rule_id".into(), json!(rule.rule_id));
    m.insert("protocol".into(), json!(rule.protocol));
    if let Some(v) = strings_value(rule.port_range.as_ref()) {
        m.insert("port_range".into(), v);
    }
    m.insert("origin_type".into(), json!(rule.origin_type));
    if let Some(v) = strings_value(rule.origin_value.as_ref()) {
        m.insert("origin_value".into(), v);
    }
    m.insert("origin_port_range".into(), json!(rule.origin_port_range));
    m.insert(
        "client_ip_pass_through_mode".into(),
        json!(rule.client_ip_pass_through_mode),
    );
    m.insert("session_persist".into(), json!(rule.session_persist));
    m.insert("session_persist_time".into(), json!(rule.session_persist_time));
    m.insert("rule_tag".into(), json!(rule.rule_tag));
    m.insert("status".into(), json!(rule.status));
    Value::Object(m)
}

fn ids(d: &ResourceData) -> Result<(String, String, String)> {
    let parts = d.id_parts(3)?;
    Ok((parts[0].to_string(), parts[1].to_string(), parts[2].to_string()))
}

fn desired_status(d: &ResourceData) -> Option<String> {
    d.head_map("l4_proxy_rules")
        .and_then(|m| map_ok_str(m, "status"))
}

impl L4ProxyRuleResource {
    async fn set_status(&self, zone_id: &str, proxy_id: &str, rule_id: &str, status: &str) -> Result<()> {
        self.service
            .execute(
                "ModifyL4ProxyRulesStatus",
                &json!({"ZoneId": zone_id, "ProxyId": proxy_id, "RuleIds": [rule_id], "Status": status}),
            )
            .await?;
        self.service
            .wait_l4_proxy_rule_status(zone_id, proxy_id, rule_id, status)
            .await
    }
}

#[async_trait]
impl Resource for L4ProxyRuleResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        l4_proxy_rule_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct CreateL4ProxyRulesResponse {
            #[serde(default)]
            l4_proxy_rule_ids: Vec<String>,
        }

        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();
        let proxy_id = d.get_str("proxy_id").unwrap_or_default().to_string();
        let rules: Vec<L4ProxyRule> = d
            .head_map("l4_proxy_rules")
            .map(expand_l4_proxy_rule)
            .into_iter()
            .collect();

        let response: CreateL4ProxyRulesResponse = self
            .service
            .write(
                "CreateL4ProxyRules",
                &json!({"ZoneId": zone_id, "ProxyId": proxy_id, "L4ProxyRules": rules}),
            )
            .await?;
        let Some(rule_id) = response.l4_proxy_rule_ids.into_iter().next() else {
            return Err(ProviderError::UnexpectedState {
                operation: "CreateL4ProxyRules".to_string(),
                state: "empty L4ProxyRuleIds".to_string(),
            });
        };
        d.set_id(build_id(&[&zone_id, &proxy_id, &rule_id]));

        self.service
            .wait_l4_proxy_rule_status(&zone_id, &proxy_id, &rule_id, "online")
            .await?;

        if desired_status(d).as_deref() == Some("offline") {
            self.set_status(&zone_id, &proxy_id, &rule_id, "offline")
                .await?;
        }

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, proxy_id, rule_id) = ids(d)?;

        match self
            .service
            .describe_l4_proxy_rule(&zone_id, &proxy_id, &rule_id)
            .await?
        {
            Some(rule) => {
                d.set("zone_id", zone_id);
                d.set("proxy_id", proxy_id);
                d.set("l4_proxy_rules", json!([flatten_l4_proxy_rule(rule)]));
            }
            None => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, proxy_id, rule_id) = ids(d)?;

        let (prior_rule, next_rule) = {
            let prior = d
                .prior("l4_proxy_rules")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(Value::as_object)
                .map(expand_l4_proxy_rule);
            let next = d.head_map("l4_proxy_rules").map(expand_l4_proxy_rule);
            (prior, next)
        };

        let prior_status = d
            .prior("l4_proxy_rules")
            .and_then(|v| v.get(0))
            .and_then(|r| r.get("status"))
            .and_then(Value::as_str)
            .unwrap_or("online")
            .to_string();

        // status 单独通过 ModifyL4ProxyRulesStatus 修改
        let strip = |rule: Option<L4ProxyRule>| {
            rule.map(|r| L4ProxyRule {
                rule_id: None,
                ..r
            })
        };
        let next_rule = strip(next_rule);
        if strip(prior_rule) != next_rule {
            if let Some(mut rule) = next_rule {
                rule.rule_id = Some(rule_id.clone());
                self.service
                    .execute(
                        "ModifyL4ProxyRules",
                        &json!({"ZoneId": zone_id, "ProxyId": proxy_id, "L4ProxyRules": [rule]}),
                    )
                    .await?;
                // 修改后规则回到修改前的状态（停用的规则保持 offline）
                self.service
                    .wait_l4_proxy_rule_status(&zone_id, &proxy_id, &rule_id, &prior_status)
                    .await?;
            }
        }

        if let Some(status) = desired_status(d) {
            if status != prior_status {
                self.set_status(&zone_id, &proxy_id, &rule_id, &status)
                    .await?;
            }
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, proxy_id, rule_id) = ids(d)?;
        self.service
            .execute(
                "DeleteL4ProxyRules",
                &json!({"ZoneId": zone_id, "ProxyId": proxy_id, "RuleIds": [rule_id]}),
            )
            .await
    }
}
