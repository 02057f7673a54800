//! `tencentcloud_teo_security_policy_config`
//!
//! Web protection policy of a site default, a single host or a policy
//! template. The policy tree is large and mirrors the API one to one, so
//! it is converted by walking the schema: `snake_case` attribute names map
//! to `PascalCase` API fields and single-item blocks map to objects.
//! Custom rules are the exception, see [`expand_security_policy`].

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::{ProviderError, Result};
use crate::hash::hash_string;
use crate::resource_data::{ID_SEPARATOR, ResourceData, build_id};
use crate::schema::{AttrType, Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::traits::Resource;

use super::{map_objects, map_str, mark_gone};

const RESOURCE: &str = "tencentcloud_teo_security_policy_config";

const ZONE_DEFAULT_POLICY: &str = "ZoneDefaultPolicy";
const HOST: &str = "Host";
const TEMPLATE: &str = "Template";

/// `custom_rules` lists and the `RuleType` each one holds.
const CUSTOM_RULE_TYPES: [(&str, &str); 2] = [
    ("precise_match_rules", "PreciseMatchRule"),
    ("basic_access_rules", "BasicAccessRule"),
];

/// API field names that are not the plain `PascalCase` of the attribute.
const API_NAMES: [(&str, &str); 3] = [
    ("block_ip_action_parameters", "BlockIPActionParameters"),
    ("http_ddos_protection", "HttpDDoSProtection"),
    ("url", "URL"),
];

pub struct SecurityPolicyConfigResource {
    service: TeoService,
}

impl SecurityPolicyConfigResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

// ============ Schema ============

fn single(schema: Schema) -> Attribute {
    Attribute::block_list(schema).max_items(1)
}

/// Action taken when a rule matches.
///
/// `extended` adds the deny and challenge parameters accepted by HTTP DDoS
/// protection and rate limiting.
fn security_action(extended: bool) -> Attribute {
    let mut schema = Schema::new()
        .attr(
            "name",
            Attribute::string().required().describe(
                "Action name: Deny, Monitor, ReturnCustomPage, Redirect, BlockIP, JSChallenge, ManagedChallenge, Disabled or Allow.",
            ),
        )
        .attr(
            "block_ip_action_parameters",
            single(Schema::new().attr(
                "duration",
                Attribute::string().required().describe("Ban duration, e.g. 120s."),
            ))
            .optional()
            .describe("Parameters of BlockIP."),
        )
        .attr(
            "return_custom_page_action_parameters",
            single(
                Schema::new()
                    .attr("response_code", Attribute::string().required().describe("Response status code."))
                    .attr("error_page_id", Attribute::string().required().describe("Custom error page ID.")),
            )
            .optional()
            .describe("Parameters of ReturnCustomPage."),
        )
        .attr(
            "redirect_action_parameters",
            single(Schema::new().attr(
                "url",
                Attribute::string().required().describe("Redirect target URL."),
            ))
            .optional()
            .describe("Parameters of Redirect."),
        );

    if extended {
        let deny = Schema::new()
            .attr("block_ip", Attribute::string().optional().describe("Whether to also ban the client IP: on or off."))
            .attr("block_ip_duration", Attribute::string().optional().describe("Ban duration when block_ip is on."))
            .attr("return_custom_page", Attribute::string().optional().describe("Whether to answer with a custom page: on or off."))
            .attr("response_code", Attribute::string().optional().describe("Custom page status code."))
            .attr("error_page_id", Attribute::string().optional().describe("Custom page ID."))
            .attr("stall", Attribute::string().optional().describe("Whether to hold the connection without answering: on or off."));
        let challenge = Schema::new()
            .attr(
                "challenge_option",
                Attribute::string()
                    .required()
                    .describe("Challenge kind: InterstitialChallenge, InlineChallenge, JSChallenge or ManagedChallenge."),
            )
            .attr("interval", Attribute::string().optional().describe("Challenge interval."))
            .attr("attester_id", Attribute::string().optional().describe("Client attester ID."));
        schema = schema
            .attr("deny_action_parameters", single(deny).optional().describe("Parameters of Deny."))
            .attr(
                "challenge_action_parameters",
                single(challenge).optional().describe("Parameters of JSChallenge and ManagedChallenge."),
            );
    }

    single(schema)
}

fn custom_rule_schema() -> Schema {
    Schema::new()
        .attr("id", Attribute::string().optional().computed().describe("Rule ID."))
        .attr("name", Attribute::string().required().describe("Rule name."))
        .attr("condition", Attribute::string().required().describe("Match expression."))
        .attr("action", security_action(false).required().describe("Action when matched."))
        .attr(
            "enabled",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(&["on", "off"]))
                .describe("Whether the rule is enabled: on or off."),
        )
        .attr("rule_type", Attribute::string().computed().describe("Rule type."))
        .attr(
            "priority",
            Attribute::int()
                .optional()
                .computed()
                .validate(Validator::IntBetween(0, 100))
                .describe("Rule priority, 0-100."),
        )
}

fn managed_rules_schema() -> Schema {
    let auto_update = Schema::new()
        .attr(
            "auto_update_to_latest_version",
            Attribute::string().required().describe("Follow the latest ruleset: on or off."),
        )
        .attr("ruleset_version", Attribute::string().computed().describe("Ruleset version in use."));
    let rule_action = Schema::new()
        .attr("rule_id", Attribute::string().required().describe("Managed rule ID."))
        .attr("action", security_action(false).required().describe("Action of the rule."));
    let group = Schema::new()
        .attr("group_id", Attribute::string().required().describe("Managed rule group name."))
        .attr(
            "sensitivity_level",
            Attribute::string()
                .required()
                .describe("Protection level: loose, normal, strict, extreme or custom."),
        )
        .attr("action", security_action(false).required().describe("Action of the group."))
        .attr(
            "rule_actions",
            Attribute::block_list(rule_action)
                .optional()
                .describe("Per-rule actions, used with sensitivity level custom."),
        );

    Schema::new()
        .attr("enabled", Attribute::string().required().describe("Whether managed rules are enabled: on or off."))
        .attr("detection_only", Attribute::string().required().describe("Observe without blocking: on or off."))
        .attr("semantic_analysis", Attribute::string().optional().computed().describe("Semantic analysis: on or off."))
        .attr("auto_update", single(auto_update).optional().computed().describe("Ruleset auto update."))
        .attr(
            "managed_rule_groups",
            Attribute::block_set(group, managed_rule_group_hash)
                .optional()
                .computed()
                .describe("Managed rule group settings."),
        )
}

fn switch_with_action(enabled_description: &'static str) -> Schema {
    Schema::new()
        .attr("enabled", Attribute::string().required().describe(enabled_description))
        .attr("action", security_action(true).optional().describe("Action when triggered."))
}

fn http_ddos_protection_schema() -> Schema {
    let adaptive = switch_with_action("Adaptive frequency control: on or off.").attr(
        "sensitivity",
        Attribute::string().optional().describe("Sensitivity: Loose, Moderate or Strict."),
    );
    let transfer_rate = Schema::new()
        .attr("minimal_avg_transfer_rate_threshold", Attribute::string().required().describe("Minimal body transfer rate, e.g. 80bps."))
        .attr("counting_period", Attribute::string().required().describe("Counting period, e.g. 60s."))
        .attr("enabled", Attribute::string().required().describe("on or off."));
    let body_timeout = Schema::new()
        .attr("idle_timeout", Attribute::string().required().describe("Body transfer idle timeout, e.g. 5s."))
        .attr("enabled", Attribute::string().required().describe("on or off."));
    let slow_attack = switch_with_action("Slow attack defense: on or off.")
        .attr(
            "minimal_request_body_transfer_rate",
            single(transfer_rate).optional().describe("Minimal body transfer rate check."),
        )
        .attr(
            "request_body_transfer_timeout",
            single(body_timeout).optional().describe("Body transfer timeout check."),
        );

    Schema::new()
        .attr("adaptive_frequency_control", single(adaptive).optional().describe("Adaptive frequency control."))
        .attr("client_filtering", single(switch_with_action("Intelligent client filtering: on or off.")).optional().describe("Intelligent client filtering."))
        .attr("bandwidth_abuse_defense", single(switch_with_action("Bandwidth abuse defense: on or off.")).optional().describe("Bandwidth abuse defense."))
        .attr("slow_attack_defense", single(slow_attack).optional().describe("Slow attack defense."))
}

fn rate_limiting_rules_schema() -> Schema {
    let rule = Schema::new()
        .attr("id", Attribute::string().optional().computed().describe("Rule ID."))
        .attr("name", Attribute::string().optional().describe("Rule name."))
        .attr("condition", Attribute::string().optional().describe("Match expression."))
        .attr("count_by", Attribute::string_set().optional().describe("Request statistics keys."))
        .attr("max_request_threshold", Attribute::int().optional().describe("Request count threshold."))
        .attr("counting_period", Attribute::string().optional().describe("Counting period, e.g. 10s."))
        .attr("action_duration", Attribute::string().optional().describe("How long the action lasts, e.g. 60s."))
        .attr("action", security_action(true).optional().describe("Action when the threshold is reached."))
        .attr("priority", Attribute::int().optional().describe("Rule priority, 0-100."))
        .attr("enabled", Attribute::string().optional().describe("Whether the rule is enabled: on or off."));
    Schema::new().attr("rules", Attribute::block_list(rule).optional().describe("Rate limiting rules."))
}

fn exception_rules_schema() -> Schema {
    let request_field = Schema::new()
        .attr("scope", Attribute::string().required().describe("Field scope, e.g. body.json or header_fields."))
        .attr("condition", Attribute::string().required().describe("Field match expression."))
        .attr("target_field", Attribute::string().required().describe("Skipped field: key or value."));
    let rule = Schema::new()
        .attr("id", Attribute::string().optional().computed().describe("Rule ID."))
        .attr("name", Attribute::string().optional().describe("Rule name."))
        .attr("condition", Attribute::string().optional().describe("Match expression."))
        .attr("skip_scope", Attribute::string().optional().describe("Skip scope: WebSecurityModules or ManagedRules."))
        .attr("skip_option", Attribute::string().optional().describe("Skip option: SkipOnAllRequestFields or SkipOnSpecifiedRequestFields."))
        .attr("web_security_modules_for_exception", Attribute::string_set().optional().describe("Skipped security modules."))
        .attr("managed_rules_for_exception", Attribute::string_set().optional().describe("Skipped managed rule IDs."))
        .attr("managed_rule_groups_for_exception", Attribute::string_set().optional().describe("Skipped managed rule groups."))
        .attr("request_fields_for_exception", Attribute::block_list(request_field).optional().describe("Skipped request fields."))
        .attr("enabled", Attribute::string().optional().describe("Whether the rule is enabled: on or off."));
    Schema::new().attr("rules", Attribute::block_list(rule).optional().describe("Exception rules."))
}

fn security_policy_schema() -> Schema {
    let custom_rules = Schema::new()
        .attr(
            "precise_match_rules",
            Attribute::block_list(custom_rule_schema()).optional().describe("Precise match rules."),
        )
        .attr(
            "basic_access_rules",
            Attribute::block_list(custom_rule_schema()).optional().describe("Basic access control rules."),
        );

    Schema::new()
        .attr("custom_rules", single(custom_rules).optional().describe("Custom rules."))
        .attr("managed_rules", single(managed_rules_schema()).optional().computed().describe("Managed rules."))
        .attr("http_ddos_protection", single(http_ddos_protection_schema()).optional().computed().describe("HTTP DDoS protection."))
        .attr("rate_limiting_rules", single(rate_limiting_rules_schema()).optional().describe("Rate limiting rules."))
        .attr("exception_rules", single(exception_rules_schema()).optional().describe("Exception rules."))
}

fn security_policy_config_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().required().force_new().describe("Site ID."))
        .attr(
            "entity",
            Attribute::string()
                .optional()
                .computed()
                .force_new()
                .validate(Validator::AllowedValues(&[ZONE_DEFAULT_POLICY, HOST, TEMPLATE]))
                .describe("Policy owner: ZoneDefaultPolicy, Host or Template. Derived from host and template_id when omitted."),
        )
        .attr("host", Attribute::string().optional().force_new().describe("Acceleration domain, for entity Host."))
        .attr("template_id", Attribute::string().optional().force_new().describe("Policy template ID, for entity Template."))
        .attr("security_policy", single(security_policy_schema()).optional().describe("Security policy."))
}

/// Managed rule groups are keyed by group name.
fn managed_rule_group_hash(group: &Value) -> i64 {
    hash_string(group.get("group_id").and_then(Value::as_str).unwrap_or_default())
}

// ============ 字段转换 ============

fn api_name(attr: &str) -> String {
    if let Some((_, name)) = API_NAMES.iter().find(|(a, _)| *a == attr) {
        return (*name).to_string();
    }
    attr.split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Configuration block to API object, following `schema`.
///
/// Computed-only attributes and blank values are left out.
pub(crate) fn to_api(schema: &Schema, block: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, attr) in &schema.attributes {
        if attr.is_computed_only() {
            continue;
        }
        let Some(value) = block.get(*name).filter(|v| !is_blank(v)) else {
            continue;
        };
        let converted = match &attr.kind {
            AttrType::BlockList(inner) | AttrType::BlockSet(inner) => {
                let items: Vec<Value> = value
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_object)
                    .map(|item| Value::Object(to_api(inner, item)))
                    .collect();
                if attr.max_items == Some(1) {
                    let Some(head) = items.into_iter().next() else {
                        continue;
                    };
                    head
                } else {
                    Value::Array(items)
                }
            }
            _ => value.clone(),
        };
        out.insert(api_name(name), converted);
    }
    out
}

/// API object to configuration block, following `schema`.
///
/// Blank fields and empty blocks are dropped so that unset options read back
/// as absent.
pub(crate) fn from_api(schema: &Schema, object: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, attr) in &schema.attributes {
        let Some(value) = object.get(&api_name(name)).filter(|v| !is_blank(v)) else {
            continue;
        };
        let converted = match &attr.kind {
            AttrType::BlockList(inner) | AttrType::BlockSet(inner) => {
                let items: Vec<Value> = match value {
                    Value::Object(o) => vec![o],
                    Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
                    _ => Vec::new(),
                }
                .into_iter()
                .map(|o| from_api(inner, o))
                .filter(|m| !m.is_empty())
                .map(Value::Object)
                .collect();
                if items.is_empty() {
                    continue;
                }
                Value::Array(items)
            }
            _ => value.clone(),
        };
        out.insert((*name).to_string(), converted);
    }
    out
}

/// `security_policy` block to the API `SecurityPolicy`.
///
/// Precise match and basic access rules share `CustomRules.Rules` and are
/// told apart by `RuleType`. Custom and exception rules are always sent, an
/// absent block clears them.
pub(crate) fn expand_security_policy(policy: &Map<String, Value>) -> Map<String, Value> {
    let mut out = to_api(&security_policy_schema(), policy);

    let custom = map_objects(policy, "custom_rules").into_iter().next();
    let rule_schema = custom_rule_schema();
    let mut rules = Vec::new();
    for (key, rule_type) in CUSTOM_RULE_TYPES {
        for rule in custom.map(|c| map_objects(c, key)).unwrap_or_default() {
            let mut converted = to_api(&rule_schema, rule);
            converted.insert("RuleType".to_string(), json!(rule_type));
            rules.push(Value::Object(converted));
        }
    }
    out.insert("CustomRules".to_string(), json!({"Rules": rules}));
    out.entry("ExceptionRules")
        .or_insert_with(|| json!({"Rules": []}));
    out
}

/// API `SecurityPolicy` to the `security_policy` block.
///
/// Custom rules of other types are not managed here and are skipped.
pub(crate) fn flatten_security_policy(policy: &Map<String, Value>) -> Value {
    let mut out = from_api(&security_policy_schema(), policy);
    out.remove("custom_rules");

    let rule_schema = custom_rule_schema();
    let rules = policy
        .get("CustomRules")
        .and_then(Value::as_object)
        .map(|c| map_objects(c, "Rules"))
        .unwrap_or_default();
    let mut custom = Map::new();
    for (key, rule_type) in CUSTOM_RULE_TYPES {
        let matching: Vec<Value> = rules
            .iter()
            .filter(|r| map_str(r, "RuleType") == Some(rule_type))
            .map(|r| Value::Object(from_api(&rule_schema, r)))
            .collect();
        if !matching.is_empty() {
            custom.insert(key.to_string(), Value::Array(matching));
        }
    }
    if !custom.is_empty() {
        out.insert("custom_rules".to_string(), json!([custom]));
    }

    json!([out])
}

// ============ 策略归属 ============

/// Which policy the resource manages.
#[derive(Debug, Clone, PartialEq)]
struct PolicyTarget {
    zone_id: String,
    entity: &'static str,
    host: Option<String>,
    template_id: Option<String>,
}

impl PolicyTarget {
    /// From configuration; `entity` is derived when omitted.
    fn from_config(d: &ResourceData) -> Result<Self> {
        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();
        let host = d.get_ok_str("host").map(str::to_string);
        let template_id = d.get_ok_str("template_id").map(str::to_string);

        let entity = match (host.is_some(), template_id.is_some()) {
            (false, false) => ZONE_DEFAULT_POLICY,
            (true, false) => HOST,
            (false, true) => TEMPLATE,
            (true, true) => {
                return Err(invalid("host and template_id cannot be set together".to_string()));
            }
        };
        if let Some(configured) = d.get_ok_str("entity").filter(|e| *e != entity) {
            return Err(invalid(format!(
                "entity: \"{configured}\" does not match the given host and template_id, expected \"{entity}\""
            )));
        }

        Ok(Self {
            zone_id,
            entity,
            host,
            template_id,
        })
    }

    /// From an ID of the form `zone#ZoneDefaultPolicy`, `zone#Host#host`
    /// or `zone#Template#template_id`.
    fn from_id(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.split(ID_SEPARATOR).collect();
        let target = |entity: &'static str, host: Option<&str>, template_id: Option<&str>| Self {
            zone_id: parts[0].to_string(),
            entity,
            host: host.map(str::to_string),
            template_id: template_id.map(str::to_string),
        };
        match parts.as_slice() {
            [zone, ZONE_DEFAULT_POLICY] if !zone.is_empty() => Ok(target(ZONE_DEFAULT_POLICY, None, None)),
            [zone, HOST, host] if !zone.is_empty() && !host.is_empty() => Ok(target(HOST, Some(*host), None)),
            [zone, TEMPLATE, template] if !zone.is_empty() && !template.is_empty() => {
                Ok(target(TEMPLATE, None, Some(*template)))
            }
            _ => Err(ProviderError::BrokenId { id: id.to_string() }),
        }
    }

    fn id(&self) -> String {
        match (&self.host, &self.template_id) {
            (Some(host), _) => build_id(&[&self.zone_id, HOST, host]),
            (_, Some(template_id)) => build_id(&[&self.zone_id, TEMPLATE, template_id]),
            _ => build_id(&[&self.zone_id, ZONE_DEFAULT_POLICY]),
        }
    }

    fn modify_request(&self, policy: &Map<String, Value>) -> Value {
        let mut request = Map::new();
        request.insert("ZoneId".to_string(), json!(self.zone_id));
        request.insert("Entity".to_string(), json!(self.entity));
        if let Some(host) = &self.host {
            request.insert("Host".to_string(), json!(host));
        }
        if let Some(template_id) = &self.template_id {
            request.insert("TemplateId".to_string(), json!(template_id));
        }
        // 旧版限速规则由 rate_limiting_rules 取代，提交时清空
        request.insert(
            "SecurityConfig".to_string(),
            json!({"RateLimitConfig": {"Switch": "on", "RateLimitUserRules": []}}),
        );
        request.insert(
            "SecurityPolicy".to_string(),
            Value::Object(expand_security_policy(policy)),
        );
        Value::Object(request)
    }
}

fn invalid(diagnostic: String) -> ProviderError {
    ProviderError::Validation {
        resource: RESOURCE.to_string(),
        diagnostics: vec![diagnostic],
    }
}

#[async_trait]
impl Resource for SecurityPolicyConfigResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        security_policy_config_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        let target = PolicyTarget::from_config(d)?;

        if let Some(policy) = d.head_map("security_policy") {
            self.service
                .execute("ModifySecurityPolicy", &target.modify_request(policy))
                .await?;
        }
        d.set_id(target.id());

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let target = PolicyTarget::from_id(d.id())?;
        match self
            .service
            .describe_security_policy(
                &target.zone_id,
                target.entity,
                target.host.as_deref(),
                target.template_id.as_deref(),
            )
            .await?
        {
            Some(policy) => {
                d.set("zone_id", target.zone_id);
                d.set("entity", target.entity);
                d.set_opt("host", target.host);
                d.set_opt("template_id", target.template_id);
                d.set("security_policy", flatten_security_policy(&policy));
            }
            None => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        let target = PolicyTarget::from_id(d.id())?;

        if d.has_change("security_policy") {
            let empty = Map::new();
            let policy = d.head_map("security_policy").unwrap_or(&empty);
            self.service
                .execute("ModifySecurityPolicy", &target.modify_request(policy))
                .await?;
        }

        self.read(d).await
    }

    /// The policy belongs to the site; removing the resource leaves it as is.
    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        log::info!("[INFO] resource `{RESOURCE}` [{}] removed from state only", d.id());
        Ok(())
    }
}
