//! `tencentcloud_teo_origin_acl`

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::json;

use crate::error::Result;
use crate::resource_data::{ResourceData, string_list};
use crate::schema::{Attribute, Schema};
use crate::services::teo::TeoService;
use crate::services::teo::types::{OriginAclEntity, OriginAclInfo};
use crate::traits::Resource;

use super::mark_gone;

const RESOURCE: &str = "tencentcloud_teo_origin_acl";

pub struct OriginAclResource {
    service: TeoService,
}

impl OriginAclResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn origin_acl_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().required().force_new().describe("Site ID."))
        .attr(
            "l7_hosts",
            Attribute::string_set()
                .optional()
                .computed()
                .describe("L7 acceleration domains bound to origin protection."),
        )
        .attr(
            "l4_proxy_ids",
            Attribute::string_set()
                .optional()
                .computed()
                .describe("L4 proxy instance IDs bound to origin protection."),
        )
        .attr(
            "status",
            Attribute::string()
                .computed()
                .describe("Origin protection status: `online`, `offline` or `updating`."),
        )
}

/// Entities to enable or disable for one instance `kind` (`l7` / `l4`).
pub(crate) fn diff_entities(kind: &str, prior: &[String], next: &[String]) -> Vec<OriginAclEntity> {
    let prior: BTreeSet<&String> = prior.iter().collect();
    let next: BTreeSet<&String> = next.iter().collect();

    let entity = |instances: Vec<&String>, mode: &str| OriginAclEntity {
        entity_type: kind.to_string(),
        instances: instances.into_iter().cloned().collect(),
        operation_mode: mode.to_string(),
    };

    let added: Vec<&String> = next.difference(&prior).copied().collect();
    let removed: Vec<&String> = prior.difference(&next).copied().collect();

    let mut entities = Vec::new();
    if !added.is_empty() {
        entities.push(entity(added, "enable"));
    }
    if !removed.is_empty() {
        entities.push(entity(removed, "disable"));
    }
    entities
}

fn prior_strings(d: &ResourceData, key: &str) -> Vec<String> {
    d.prior(key)
        .and_then(|v| v.as_array())
        .map(|items| string_list(items))
        .unwrap_or_default()
}

pub(crate) fn expand_modify_entities(d: &ResourceData) -> Vec<OriginAclEntity> {
    let mut entities = Vec::new();
    for (key, kind) in [("l7_hosts", "l7"), ("l4_proxy_ids", "l4")] {
        if d.has_change(key) {
            entities.extend(diff_entities(
                kind,
                &prior_strings(d, key),
                &d.get_string_list(key),
            ));
        }
    }
    entities
}

pub(crate) fn flatten_origin_acl(d: &mut ResourceData, info: OriginAclInfo) {
    d.set("l7_hosts", info.l7_hosts.unwrap_or_default());
    d.set("l4_proxy_ids", info.l4_proxy_ids.unwrap_or_default());
    d.set_opt("status", info.status);
}

#[async_trait]
impl Resource for OriginAclResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        origin_acl_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();
        let mut request = json!({"ZoneId": zone_id});
        let l7_hosts = d.get_string_list("l7_hosts");
        if !l7_hosts.is_empty() {
            request["L7Hosts"] = json!(l7_hosts);
        }
        let l4_proxy_ids = d.get_string_list("l4_proxy_ids");
        if !l4_proxy_ids.is_empty() {
            request["L4ProxyIds"] = json!(l4_proxy_ids);
        }

        self.service.execute("EnableOriginACL", &request).await?;
        d.set_id(zone_id.clone());

        self.service.wait_origin_acl_status(&zone_id, "online").await?;
        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let zone_id = d.id().to_string();
        match self.service.describe_origin_acl(&zone_id).await? {
            // 已关闭的源站防护视为不存在
            Some(info) if info.status.as_deref() != Some("offline") => {
                d.set("zone_id", zone_id);
                flatten_origin_acl(d, info);
            }
            _ => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        let zone_id = d.id().to_string();
        let entities = expand_modify_entities(d);

        if !entities.is_empty() {
            self.service
                .execute(
                    "ModifyOriginACL",
                    &json!({"ZoneId": zone_id, "OriginACLEntities": entities}),
                )
                .await?;
            self.service.wait_origin_acl_status(&zone_id, "online").await?;
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let zone_id = d.id().to_string();
        self.service
            .execute("DisableOriginACL", &json!({"ZoneId": zone_id}))
            .await?;
        self.service.wait_origin_acl_status(&zone_id, "offline").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, config, object, service};
    use serde_json::Value;
    use std::sync::Arc;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn diff_produces_enable_and_disable() {
        let entities = diff_entities("l7", &strings(&["a.com", "b.com"]), &strings(&["b.com", "c.com"]));
        assert_eq!(
            serde_json::to_value(&entities).unwrap_or_default(),
            json!([
                {"Type": "l7", "Instances": ["c.com"], "OperationMode": "enable"},
                {"Type": "l7", "Instances": ["a.com"], "OperationMode": "disable"}
            ])
        );
        assert!(diff_entities("l4", &strings(&["x"]), &strings(&["x"])).is_empty());
    }

    #[test]
    fn only_changed_kinds_produce_entities() {
        let schema = origin_acl_schema();
        let prior = json!({"zone_id": "zone-1", "l7_hosts": ["a.com"], "l4_proxy_ids": ["sid-1"], "status": "online"});
        let next = json!({"zone_id": "zone-1", "l7_hosts": ["a.com"], "l4_proxy_ids": []});
        let d = ResourceData::for_update(&schema, "zone-1", object(prior), object(next));
        let entities = expand_modify_entities(&d);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_type, "l4");
        assert_eq!(entities[0].operation_mode, "disable");
    }

    fn described(status: &str) -> Value {
        json!({"OriginACLInfo": {"L7Hosts": ["a.com"], "L4ProxyIds": [], "Status": status}})
    }

    #[tokio::test]
    async fn create_enables_and_waits() {
        let transport = Arc::new(
            Scripted::default()
                .reply("DescribeOriginACL", described("online"))
                .reply("DescribeOriginACL", described("online")),
        );
        let resource = OriginAclResource::new(service(&transport));
        let mut d = config(&origin_acl_schema(), json!({"zone_id": "zone-1", "l7_hosts": ["a.com"]}));

        let result = resource.create(&mut d).await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(d.id(), "zone-1");
        assert_eq!(d.get_str("status"), Some("online"));
        assert_eq!(
            transport.payload("EnableOriginACL"),
            json!({"ZoneId": "zone-1", "L7Hosts": ["a.com"]})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delete_waits_for_offline() {
        let transport = Arc::new(
            Scripted::default()
                .reply("DescribeOriginACL", described("updating"))
                .reply("DescribeOriginACL", described("offline")),
        );
        let resource = OriginAclResource::new(service(&transport));
        let mut d = ResourceData::from_state(&origin_acl_schema(), "zone-1", object(json!({"zone_id": "zone-1"})));

        let result = resource.delete(&mut d).await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(
            transport.actions(),
            vec!["DisableOriginACL", "DescribeOriginACL", "DescribeOriginACL"]
        );
    }

    #[tokio::test]
    async fn disabled_acl_reads_as_gone() {
        let transport = Arc::new(Scripted::default().reply("DescribeOriginACL", described("offline")));
        let resource = OriginAclResource::new(service(&transport));
        let mut d = ResourceData::from_state(&origin_acl_schema(), "zone-1", object(json!({"zone_id": "zone-1"})));
        assert!(resource.read(&mut d).await.is_ok());
        assert!(d.id().is_empty());
    }
}
