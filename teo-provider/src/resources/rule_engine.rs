//! `tencentcloud_teo_rule_engine`

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::resource_data::{ResourceData, build_id};
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::services::teo::types::{
    CodeAction, NormalAction, RewriteAction, Rule, RuleAction, RuleAndConditions,
    RuleCodeActionParams, RuleCondition, RuleItem, RuleNormalActionParams,
    RuleRewriteActionParams,
};
use crate::traits::Resource;

use super::{map_i64, map_objects, map_ok_str, map_strings, mark_gone, strings_value};

const RESOURCE: &str = "tencentcloud_teo_rule_engine";

/// Arguments sent by `ModifyRule`.
const MUTABLE_ARGS: [&str; 3] = ["rule_name", "status", "rules"];

pub struct RuleEngineResource {
    service: TeoService,
}

impl RuleEngineResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn condition_schema() -> Schema {
    Schema::new()
        .attr(
            "operator",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(&["equal", "notequal"]))
                .describe("Condition operator: equal or notequal."),
        )
        .attr(
            "target",
            Attribute::string()
                .required()
                .describe("Matched request field, e.g. host, extension, full_url, url, client_country."),
        )
        .attr(
            "values",
            Attribute::string_set()
                .required()
                .describe("Values of the matched field."),
        )
}

fn parameter_schema(kind: &str) -> Schema {
    let schema = Schema::new()
        .attr("name", Attribute::string().required().describe("Parameter name."))
        .attr(
            "values",
            Attribute::string_set().required().describe("Parameter values."),
        );
    match kind {
        "rewrite" => schema.attr(
            "action",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(&["add", "del", "set"]))
                .describe("Header operation: add, del or set."),
        ),
        "code" => schema.attr(
            "status_code",
            Attribute::int().required().describe("HTTP status code."),
        ),
        _ => schema,
    }
}

fn action_schema(kind: &str, description: &'static str) -> Attribute {
    Attribute::block_list(
        Schema::new()
            .attr("action", Attribute::string().required().describe("Action name."))
            .attr(
                "parameters",
                Attribute::block_list(parameter_schema(kind))
                    .required()
                    .describe("Action parameters."),
            ),
    )
    .optional()
    .max_items(1)
    .describe(description)
}

fn rule_engine_schema() -> Schema {
    let and_conditions = Schema::new().attr(
        "and",
        Attribute::block_list(condition_schema())
            .required()
            .describe("Conditions that must all match."),
    );
    let actions = Schema::new()
        .attr("normal_action", action_schema("normal", "Common action."))
        .attr("rewrite_action", action_schema("rewrite", "Request or response header rewrite."))
        .attr("code_action", action_schema("code", "Action that carries a status code."));
    let rule = Schema::new()
        .attr(
            "or",
            Attribute::block_list(and_conditions)
                .required()
                .describe("Condition groups; the rule fires when any group matches."),
        )
        .attr(
            "actions",
            Attribute::block_list(actions)
                .required()
                .describe("Actions applied when the rule fires."),
        );

    Schema::new()
        .attr("zone_id", Attribute::string().required().force_new().describe("Site ID."))
        .attr("rule_id", Attribute::string().computed().describe("Rule ID."))
        .attr(
            "rule_name",
            Attribute::string()
                .required()
                .validate(Validator::NotEmpty)
                .describe("Rule name."),
        )
        .attr(
            "status",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(&["enable", "disable"]))
                .describe("Rule status: enable or disable."),
        )
        .attr(
            "rule_priority",
            Attribute::int().computed().describe("Rule priority, lower runs first."),
        )
        .attr(
            "rules",
            Attribute::block_list(rule).required().describe("Rule items."),
        )
}

// ============ 请求构造 ============

fn expand_parameters<T>(m: &Map<String, Value>, each: impl Fn(&Map<String, Value>) -> T) -> Option<Vec<T>> {
    Some(map_objects(m, "parameters").into_iter().map(each).collect())
}

fn expand_action(m: &Map<String, Value>) -> RuleAction {
    let head = |key: &str| map_objects(m, key).into_iter().next();

    RuleAction {
        normal_action: head("normal_action").map(|a| NormalAction {
            action: map_ok_str(a, "action"),
            parameters: expand_parameters(a, |p| RuleNormalActionParams {
                name: map_ok_str(p, "name"),
                values: Some(map_strings(p, "values")),
            }),
        }),
        rewrite_action: head("rewrite_action").map(|a| RewriteAction {
            action: map_ok_str(a, "action"),
            parameters: expand_parameters(a, |p| RuleRewriteActionParams {
                action: map_ok_str(p, "action"),
                name: map_ok_str(p, "name"),
                values: Some(map_strings(p, "values")),
            }),
        }),
        code_action: head("code_action").map(|a| CodeAction {
            action: map_ok_str(a, "action"),
            parameters: expand_parameters(a, |p| RuleCodeActionParams {
                name: map_ok_str(p, "name"),
                values: Some(map_strings(p, "values")),
                status_code: map_i64(p, "status_code"),
            }),
        }),
    }
}

/// `rules` blocks to API rules: `or` becomes the outer `Conditions`, each
/// `and` the inner one.
pub(crate) fn expand_rules(items: &[Value]) -> Vec<Rule> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|rule| Rule {
            conditions: Some(
                map_objects(rule, "or")
                    .into_iter()
                    .map(|group| RuleAndConditions {
                        conditions: Some(
                            map_objects(group, "and")
                                .into_iter()
                                .map(|c| RuleCondition {
                                    operator: map_ok_str(c, "operator"),
                                    target: map_ok_str(c, "target"),
                                    values: Some(map_strings(c, "values")),
                                })
                                .collect(),
                        ),
                    })
                    .collect(),
            ),
            actions: Some(map_objects(rule, "actions").into_iter().map(expand_action).collect()),
        })
        .collect()
}

// ============ 响应展开 ============

fn flatten_parameters<T>(params: Option<&Vec<T>>, each: impl Fn(&T) -> Value) -> Value {
    params.map(|p| p.iter().map(each).collect()).unwrap_or(json!([]))
}

fn flatten_action(action: &RuleAction) -> Value {
    let mut m = Map::new();
    if let Some(a) = &action.normal_action {
        m.insert(
            "normal_action".to_string(),
            json!([{
                "action": a.action,
                "parameters": flatten_parameters(a.parameters.as_ref(), |p| json!({
                    "name": p.name,
                    "values": strings_value(p.values.as_ref()),
                })),
            }]),
        );
    }
    if let Some(a) = &action.rewrite_action {
        m.insert(
            "rewrite_action".to_string(),
            json!([{
                "action": a.action,
                "parameters": flatten_parameters(a.parameters.as_ref(), |p| json!({
                    "action": p.action,
                    "name": p.name,
                    "values": strings_value(p.values.as_ref()),
                })),
            }]),
        );
    }
    if let Some(a) = &action.code_action {
        m.insert(
            "code_action".to_string(),
            json!([{
                "action": a.action,
                "parameters": flatten_parameters(a.parameters.as_ref(), |p| json!({
                    "name": p.name,
                    "values": strings_value(p.values.as_ref()),
                    "status_code": p.status_code,
                })),
            }]),
        );
    }
    Value::Object(m)
}

pub(crate) fn flatten_rules(rules: &[Rule]) -> Value {
    rules
        .iter()
        .map(|rule| {
            let or: Vec<Value> = rule
                .conditions
                .iter()
                .flatten()
                .map(|group| {
                    let and: Vec<Value> = group
                        .conditions
                        .iter()
                        .flatten()
                        .map(|c| {
                            json!({
                                "operator": c.operator,
                                "target": c.target,
                                "values": strings_value(c.values.as_ref()),
                            })
                        })
                        .collect();
                    json!({"and": and})
                })
                .collect();
            let actions: Vec<Value> = rule.actions.iter().flatten().map(flatten_action).collect();
            json!({"or": or, "actions": actions})
        })
        .collect()
}

fn apply(d: &mut ResourceData, zone_id: &str, item: RuleItem) {
    d.set("zone_id", zone_id);
    d.set_opt("rule_id", item.rule_id);
    d.set_opt("rule_name", item.rule_name);
    d.set_opt("status", item.status);
    d.set_opt("rule_priority", item.rule_priority);
    d.set("rules", flatten_rules(item.rules.as_deref().unwrap_or_default()));
}

fn ids(d: &ResourceData) -> Result<(String, String)> {
    let parts = d.id_parts(2)?;
    Ok((parts[0].to_string(), parts[1].to_string()))
}

#[async_trait]
impl Resource for RuleEngineResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        rule_engine_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct CreateRuleResponse {
            rule_id: String,
        }

        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();
        let request = json!({
            "ZoneId": zone_id,
            "RuleName": d.get_str("rule_name"),
            "Status": d.get_str("status"),
            "Rules": expand_rules(d.get_list("rules")),
        });

        let response: CreateRuleResponse = self.service.write("CreateRule", &request).await?;
        d.set_id(build_id(&[&zone_id, &response.rule_id]));

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, rule_id) = ids(d)?;
        match self.service.describe_rule_engine(&zone_id, &rule_id).await? {
            Some(item) => apply(d, &zone_id, item),
            None => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, rule_id) = ids(d)?;

        if d.has_changes(&MUTABLE_ARGS) {
            // ModifyRule 要求完整的 Rules
            let request = json!({
                "ZoneId": zone_id,
                "RuleId": rule_id,
                "RuleName": d.get_str("rule_name"),
                "Status": d.get_str("status"),
                "Rules": expand_rules(d.get_list("rules")),
            });
            self.service.execute("ModifyRule", &request).await?;
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, rule_id) = ids(d)?;
        self.service
            .execute("DeleteRules", &json!({"ZoneId": zone_id, "RuleIds": [rule_id]}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, config, object, service};
    use std::sync::Arc;

    fn cache_rule() -> Value {
        json!({
            "or": [{"and": [
                {"operator": "equal", "target": "extension", "values": ["jpg", "png"]},
                {"operator": "notequal", "target": "host", "values": ["static.example.com"]}
            ]}],
            "actions": [
                {"normal_action": [{"action": "CachePrefresh", "parameters": [
                    {"name": "Switch", "values": ["on"]},
                    {"name": "CachePrefreshPercent", "values": ["90"]}
                ]}]},
                {"rewrite_action": [{"action": "ResponseHeader", "parameters": [
                    {"action": "set", "name": "Cache-Control", "values": ["max-age=600"]}
                ]}]},
                {"code_action": [{"action": "ErrorPage", "parameters": [
                    {"name": "ErrorPage", "values": ["https://example.com/404.html"], "status_code": 404}
                ]}]}
            ]
        })
    }

    fn remote_rules() -> Value {
        json!([{
            "Conditions": [{"Conditions": [
                {"Operator": "equal", "Target": "extension", "Values": ["jpg", "png"]},
                {"Operator": "notequal", "Target": "host", "Values": ["static.example.com"]}
            ]}],
            "Actions": [
                {"NormalAction": {"Action": "CachePrefresh", "Parameters": [
                    {"Name": "Switch", "Values": ["on"]},
                    {"Name": "CachePrefreshPercent", "Values": ["90"]}
                ]}},
                {"RewriteAction": {"Action": "ResponseHeader", "Parameters": [
                    {"Action": "set", "Name": "Cache-Control", "Values": ["max-age=600"]}
                ]}},
                {"CodeAction": {"Action": "ErrorPage", "Parameters": [
                    {"Name": "ErrorPage", "Values": ["https://example.com/404.html"], "StatusCode": 404}
                ]}}
            ]
        }])
    }

    fn described(status: &str) -> Value {
        json!({"RuleItems": [
            {"RuleId": "rule-other", "RuleName": "other", "Status": "enable", "Rules": []},
            {"RuleId": "rule-1", "RuleName": "images", "Status": status, "RulePriority": 2, "Rules": remote_rules()}
        ]})
    }

    #[test]
    fn rules_nest_or_and_conditions() {
        let rules = expand_rules(&[cache_rule()]);
        assert_eq!(serde_json::to_value(&rules).ok(), Some(remote_rules()));
    }

    #[test]
    fn single_action_kind_is_sent() {
        let rules = expand_rules(&[json!({
            "or": [{"and": [{"operator": "equal", "target": "host", "values": ["a.example.com"]}]}],
            "actions": [{"normal_action": [{"action": "MaxAge", "parameters": [{"name": "FollowOrigin", "values": ["on"]}]}]}]
        })]);
        let sent = serde_json::to_value(&rules).unwrap_or_default();
        let action = &sent[0]["Actions"][0];
        assert_eq!(action["NormalAction"]["Action"], "MaxAge");
        assert!(action.get("RewriteAction").is_none());
        assert!(action.get("CodeAction").is_none());
    }

    #[tokio::test]
    async fn create_reads_back_rule() {
        let transport = Arc::new(
            Scripted::default()
                .reply("CreateRule", json!({"RuleId": "rule-1"}))
                .reply("DescribeRules", described("enable")),
        );
        let resource = RuleEngineResource::new(service(&transport));
        let mut d = config(
            &rule_engine_schema(),
            json!({"zone_id": "zone-1", "rule_name": "images", "status": "enable", "rules": [cache_rule()]}),
        );

        let result = resource.create(&mut d).await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(d.id(), "zone-1#rule-1");

        let sent = transport.payload("CreateRule");
        assert_eq!(sent["ZoneId"], "zone-1");
        assert_eq!(sent["RuleName"], "images");
        assert_eq!(sent["Status"], "enable");
        assert_eq!(sent["Rules"], remote_rules());
        assert_eq!(
            transport.payload("DescribeRules"),
            json!({"ZoneId": "zone-1", "Filters": [{"Name": "rule-id", "Values": ["rule-1"]}]})
        );

        assert_eq!(d.get_str("rule_id"), Some("rule-1"));
        assert_eq!(d.get_i64("rule_priority"), Some(2));
        let code = &d.get_list("rules")[0]["actions"][2]["code_action"][0];
        assert_eq!(code["parameters"][0]["status_code"], 404);
    }

    #[tokio::test]
    async fn missing_rule_is_gone() {
        let transport = Arc::new(Scripted::default().reply(
            "DescribeRules",
            json!({"RuleItems": [{"RuleId": "rule-other", "Rules": []}]}),
        ));
        let resource = RuleEngineResource::new(service(&transport));
        let mut d = ResourceData::with_id("zone-1#rule-1");

        assert!(resource.read(&mut d).await.is_ok());
        assert!(d.id().is_empty());
    }

    #[tokio::test]
    async fn status_change_resends_whole_rule() {
        let transport = Arc::new(Scripted::default().reply("DescribeRules", described("disable")));
        let resource = RuleEngineResource::new(service(&transport));
        let schema = rule_engine_schema();

        let prior = json!({"zone_id": "zone-1", "rule_id": "rule-1", "rule_name": "images", "status": "enable", "rule_priority": 2, "rules": [cache_rule()]});
        let next = json!({"zone_id": "zone-1", "rule_name": "images", "status": "disable", "rules": [cache_rule()]});
        let mut d = ResourceData::for_update(&schema, "zone-1#rule-1", object(prior), object(next));

        assert!(resource.update(&mut d).await.is_ok());
        let sent = transport.payload("ModifyRule");
        assert_eq!(sent["RuleId"], "rule-1");
        assert_eq!(sent["Status"], "disable");
        assert_eq!(sent["Rules"], remote_rules());
        assert_eq!(d.get_str("status"), Some("disable"));
    }

    #[tokio::test]
    async fn unchanged_rule_is_not_modified() {
        let transport = Arc::new(
            Scripted::default()
                .reply("DescribeRules", described("enable"))
                .reply("DescribeRules", described("enable")),
        );
        let resource = RuleEngineResource::new(service(&transport));
        let schema = rule_engine_schema();

        let mut stored = ResourceData::from_state(&schema, "zone-1#rule-1", Map::new());
        assert!(resource.read(&mut stored).await.is_ok());
        let prior = stored.into_state(&schema).unwrap_or_default();

        let next = json!({"zone_id": "zone-1", "rule_name": "images", "status": "enable", "rules": [cache_rule()]});
        let mut d = ResourceData::for_update(&schema, "zone-1#rule-1", prior, object(next));
        assert!(!d.has_changes(&MUTABLE_ARGS));

        assert!(resource.update(&mut d).await.is_ok());
        assert_eq!(transport.actions(), vec!["DescribeRules", "DescribeRules"]);
    }

    #[tokio::test]
    async fn delete_sends_rule_id() {
        let transport = Arc::new(Scripted::default());
        let resource = RuleEngineResource::new(service(&transport));
        let mut d = ResourceData::with_id("zone-1#rule-1");

        assert!(resource.delete(&mut d).await.is_ok());
        assert_eq!(
            transport.payload("DeleteRules"),
            json!({"ZoneId": "zone-1", "RuleIds": ["rule-1"]})
        );
    }
}
