//! `tencentcloud_teo_security_ip_group`

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{ProviderError, Result};
use crate::resource_data::{ResourceData, build_id};
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::services::teo::types::IpGroup;
use crate::traits::Resource;

use super::{map_str, map_strings, mark_gone};

const RESOURCE: &str = "tencentcloud_teo_security_ip_group";

pub struct SecurityIpGroupResource {
    service: TeoService,
}

impl SecurityIpGroupResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn ip_group_schema() -> Schema {
    Schema::new()
        .attr("group_id", Attribute::int().computed().describe("IP group ID."))
        .attr(
            "name",
            Attribute::string()
                .required()
                .validate(Validator::NotEmpty)
                .describe("IP group name."),
        )
        .attr(
            "content",
            Attribute::string_set()
                .required()
                .describe("IP addresses or CIDR ranges in the group."),
        )
}

fn security_ip_group_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().required().force_new().describe("Site ID."))
        .attr(
            "ip_group",
            Attribute::block_list(ip_group_schema())
                .required()
                .max_items(1)
                .describe("IP group configuration."),
        )
}

/// One `ModifySecurityIPGroup` call: the group body and its `Mode`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IpGroupChange {
    pub mode: &'static str,
    pub group: IpGroup,
}

/// Calls needed to move the group from `prior` to `next`.
///
/// A rename rewrites the whole group (`update`); otherwise added and removed
/// entries are sent separately as `append` and `remove`.
pub(crate) fn plan_ip_group_changes(group_id: i64, prior: &IpGroup, next: &IpGroup) -> Vec<IpGroupChange> {
    if prior.name != next.name {
        return vec![IpGroupChange {
            mode: "update",
            group: IpGroup {
                group_id: Some(group_id),
                ..next.clone()
            },
        }];
    }

    let before: BTreeSet<&String> = prior.content.iter().collect();
    let after: BTreeSet<&String> = next.content.iter().collect();
    let change = |mode: &'static str, content: Vec<&String>| IpGroupChange {
        mode,
        group: IpGroup {
            group_id: Some(group_id),
            name: next.name.clone(),
            content: content.into_iter().cloned().collect(),
        },
    };

    let added: Vec<&String> = after.difference(&before).copied().collect();
    let removed: Vec<&String> = before.difference(&after).copied().collect();

    let mut changes = Vec::new();
    if !added.is_empty() {
        changes.push(change("append", added));
    }
    if !removed.is_empty() {
        changes.push(change("remove", removed));
    }
    changes
}

fn expand_ip_group(block: Option<&serde_json::Map<String, Value>>) -> IpGroup {
    block
        .map(|m| IpGroup {
            group_id: None,
            name: map_str(m, "name").unwrap_or_default().to_string(),
            content: map_strings(m, "content"),
        })
        .unwrap_or_default()
}

fn ids(d: &ResourceData) -> Result<(String, i64)> {
    let parts = d.id_parts(2)?;
    let group_id = parts[1]
        .parse::<i64>()
        .map_err(|_| ProviderError::BrokenId { id: d.id().to_string() })?;
    Ok((parts[0].to_string(), group_id))
}

pub(crate) fn flatten_ip_group(group: IpGroup) -> Value {
    json!([{
        "group_id": group.group_id,
        "name": group.name,
        "content": group.content,
    }])
}

#[async_trait]
impl Resource for SecurityIpGroupResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        security_ip_group_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct CreateSecurityIpGroupResponse {
            group_id: i64,
        }

        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();
        let group = expand_ip_group(d.head_map("ip_group"));

        let response: CreateSecurityIpGroupResponse = self
            .service
            .write(
                "CreateSecurityIPGroup",
                &json!({"ZoneId": zone_id, "IPGroup": group}),
            )
            .await?;
        d.set_id(build_id(&[&zone_id, &response.group_id.to_string()]));

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, group_id) = ids(d)?;
        match self
            .service
            .describe_security_ip_group(&zone_id, group_id)
            .await?
        {
            Some(group) => {
                d.set("zone_id", zone_id);
                d.set("ip_group", flatten_ip_group(group));
            }
            None => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, group_id) = ids(d)?;

        if d.has_change("ip_group") {
            let prior_block = d
                .prior("ip_group")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(Value::as_object);
            let prior = expand_ip_group(prior_block);
            let next = expand_ip_group(d.head_map("ip_group"));

            for change in plan_ip_group_changes(group_id, &prior, &next) {
                self.service
                    .execute(
                        "ModifySecurityIPGroup",
                        &json!({"ZoneId": zone_id, "IPGroup": change.group, "Mode": change.mode}),
                    )
                    .await?;
            }
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, group_id) = ids(d)?;
        self.service
            .execute(
                "DeleteSecurityIPGroup",
                &json!({"ZoneId": zone_id, "GroupId": group_id}),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, config, object, service};
    use std::sync::Arc;

    fn group(name: &str, content: &[&str]) -> IpGroup {
        IpGroup {
            group_id: None,
            name: name.to_string(),
            content: content.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn rename_rewrites_whole_group() {
        let changes = plan_ip_group_changes(7, &group("a", &["1.1.1.1"]), &group("b", &["2.2.2.2"]));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].mode, "update");
        assert_eq!(changes[0].group.group_id, Some(7));
        assert_eq!(changes[0].group.content, vec!["2.2.2.2"]);
    }

    #[test]
    fn content_changes_split_into_append_and_remove() {
        let changes = plan_ip_group_changes(
            7,
            &group("a", &["1.1.1.1", "2.2.2.2"]),
            &group("a", &["2.2.2.2", "10.0.0.0/8"]),
        );
        let modes: Vec<&str> = changes.iter().map(|c| c.mode).collect();
        assert_eq!(modes, vec!["append", "remove"]);
        assert_eq!(changes[0].group.content, vec!["10.0.0.0/8"]);
        assert_eq!(changes[1].group.content, vec!["1.1.1.1"]);
    }

    #[test]
    fn non_numeric_group_id_is_broken() {
        let d = ResourceData::with_id("zone-1#abc");
        assert!(matches!(ids(&d), Err(ProviderError::BrokenId { .. })));
    }

    #[tokio::test]
    async fn create_reads_back_group() {
        let transport = Arc::new(
            Scripted::default()
                .reply("CreateSecurityIPGroup", json!({"GroupId": 42}))
                .reply(
                    "DescribeSecurityIPGroup",
                    json!({"IPGroups": [{"GroupId": 42, "Name": "office", "Content": ["1.1.1.1"]}]}),
                ),
        );
        let resource = SecurityIpGroupResource::new(service(&transport));
        let mut d = config(
            &security_ip_group_schema(),
            json!({"zone_id": "zone-1", "ip_group": [{"name": "office", "content": ["1.1.1.1"]}]}),
        );

        let result = resource.create(&mut d).await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(d.id(), "zone-1#42");
        assert_eq!(
            transport.payload("CreateSecurityIPGroup"),
            json!({"ZoneId": "zone-1", "IPGroup": {"Name": "office", "Content": ["1.1.1.1"]}})
        );
        assert_eq!(
            d.head_map("ip_group").and_then(|m| m.get("group_id")),
            Some(&json!(42))
        );
        assert_eq!(
            transport.payload("DescribeSecurityIPGroup"),
            json!({"ZoneId": "zone-1", "GroupIds": [42]})
        );
    }

    #[tokio::test]
    async fn update_sends_append() {
        let schema = security_ip_group_schema();
        let prior = json!({"zone_id": "zone-1", "ip_group": [{"group_id": 42, "name": "office", "content": ["1.1.1.1"]}]});
        let next = json!({"zone_id": "zone-1", "ip_group": [{"name": "office", "content": ["1.1.1.1", "2.2.2.2"]}]});
        let transport = Arc::new(Scripted::default());
        let resource = SecurityIpGroupResource::new(service(&transport));
        let mut d = ResourceData::for_update(&schema, "zone-1#42", object(prior), object(next));

        assert!(resource.update(&mut d).await.is_ok());
        assert_eq!(
            transport.payload("ModifySecurityIPGroup"),
            json!({
                "ZoneId": "zone-1",
                "IPGroup": {"GroupId": 42, "Name": "office", "Content": ["2.2.2.2"]},
                "Mode": "append"
            })
        );
    }

    #[tokio::test]
    async fn unchanged_group_is_not_modified() {
        let remote = json!({"IPGroups": [{"GroupId": 42, "Name": "office", "Content": ["2.2.2.2", "1.1.1.1"]}]});
        let transport = Arc::new(
            Scripted::default()
                .reply("DescribeSecurityIPGroup", remote.clone())
                .reply("DescribeSecurityIPGroup", remote),
        );
        let resource = SecurityIpGroupResource::new(service(&transport));
        let schema = security_ip_group_schema();

        let mut stored = ResourceData::from_state(&schema, "zone-1#42", serde_json::Map::new());
        assert!(resource.read(&mut stored).await.is_ok());
        let prior = stored.into_state(&schema).unwrap_or_default();

        let next = json!({"zone_id": "zone-1", "ip_group": [{"name": "office", "content": ["1.1.1.1", "2.2.2.2"]}]});
        let mut d = ResourceData::for_update(&schema, "zone-1#42", prior, object(next));
        assert!(!d.has_change("ip_group"));

        assert!(resource.update(&mut d).await.is_ok());
        assert!(transport.payload("ModifySecurityIPGroup").is_null());
        assert_eq!(d.get_list("ip_group")[0]["group_id"], 42);
    }
}
