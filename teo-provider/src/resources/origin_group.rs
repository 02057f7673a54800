//! `tencentcloud_teo_origin_group`

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::hash::origin_record_hash;
use crate::resource_data::{ResourceData, build_id};
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::services::teo::types::{OriginGroup, OriginGroupRequest, OriginRecord};
use crate::traits::Resource;

use super::{
    expand_private_parameters, flatten_private_parameters, map_bool, map_ok_i64, map_ok_str,
    map_str, mark_gone, private_parameter_schema,
};

const RESOURCE: &str = "tencentcloud_teo_origin_group";

pub struct OriginGroupResource {
    service: TeoService,
}

impl OriginGroupResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn record_schema() -> Schema {
    Schema::new()
        .attr("record_id", Attribute::string().computed().describe("Origin record ID."))
        .attr(
            "record",
            Attribute::string()
                .required()
                .describe("Origin address: an IPv4/IPv6 address, a domain or a COS/S3 bucket domain."),
        )
        .attr(
            "type",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["IP_DOMAIN", "COS", "AWS_S3"]))
                .describe("Origin type, `IP_DOMAIN` by default."),
        )
        .attr(
            "weight",
            Attribute::int()
                .optional()
                .validate(Validator::IntBetween(1, 100))
                .describe("Origin weight. Either all records or none of them carry a weight."),
        )
        .attr(
            "private",
            Attribute::bool()
                .optional()
                .computed()
                .describe("Whether to use private authentication, only for COS and AWS_S3 origins."),
        )
        .attr(
            "private_parameters",
            Attribute::block_list(private_parameter_schema())
                .optional()
                .describe("Private authentication parameters, only when `private` is true."),
        )
}

fn reference_schema() -> Schema {
    Schema::new()
        .attr("instance_type", Attribute::string().computed())
        .attr("instance_id", Attribute::string().computed())
        .attr("instance_name", Attribute::string().computed())
}

fn origin_group_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().required().force_new().describe("Site ID."))
        .attr(
            "name",
            Attribute::string()
                .required()
                .validate(Validator::NotEmpty)
                .describe("Origin group name."),
        )
        .attr(
            "type",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(&["GENERAL", "HTTP"]))
                .describe("Origin group type. `HTTP` groups may only be used by L7 services."),
        )
        .attr(
            "records",
            Attribute::block_set(record_schema(), origin_record_hash)
                .required()
                .describe("Origin records of the group."),
        )
        .attr(
            "host_header",
            Attribute::string()
                .optional()
                .describe("Back-to-origin Host header, only for `HTTP` groups."),
        )
        .attr("origin_group_id", Attribute::string().computed().describe("Origin group ID."))
        .attr(
            "references",
            Attribute::block_list(reference_schema())
                .computed()
                .describe("Instances referencing this origin group."),
        )
        .attr("create_time", Attribute::string().computed().describe("Creation time."))
        .attr("update_time", Attribute::string().computed().describe("Last modification time."))
}

pub(crate) fn expand_origin_record(m: &Map<String, Value>) -> OriginRecord {
    OriginRecord {
        record_id: map_ok_str(m, "record_id"),
        record: map_str(m, "record").unwrap_or_default().to_string(),
        record_type: map_ok_str(m, "type"),
        weight: map_ok_i64(m, "weight"),
        private: map_bool(m, "private"),
        private_parameters: expand_private_parameters(m),
    }
}

/// Request body for create (`group_id = None`) or modify.
///
/// Records matching a prior record by hash keep its `RecordId`.
pub(crate) fn expand_origin_group(d: &ResourceData, group_id: Option<String>) -> OriginGroupRequest {
    let known_ids: HashMap<i64, String> = d
        .prior("records")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|r| {
                    let id = r.get("record_id").and_then(Value::as_str)?;
                    (!id.is_empty()).then(|| (origin_record_hash(r), id.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    let records = d
        .get_list("records")
        .iter()
        .filter_map(|r| {
            let m = r.as_object()?;
            let mut record = expand_origin_record(m);
            if record.record_id.is_none() {
                record.record_id = known_ids.get(&origin_record_hash(r)).cloned();
            }
            Some(record)
        })
        .collect();

    OriginGroupRequest {
        zone_id: d.get_str("zone_id").unwrap_or_default().to_string(),
        group_id,
        name: d.get_str("name").unwrap_or_default().to_string(),
        group_type: d.get_str("type").unwrap_or_default().to_string(),
        records,
        host_header: d.get_ok_str("host_header").map(str::to_string),
    }
}

pub(crate) fn flatten_origin_record(record: OriginRecord) -> Value {
    let mut m = Map::new();
    m.insert("record_id".into(), json!(record.record_id));
    m.insert("record".into(), json!(record.record));
    m.insert("type".into(), json!(record.record_type));
    m.insert("weight".into(), json!(record.weight));
    m.insert("private".into(), json!(record.private));
    if let Some(params) = record.private_parameters.filter(|p| !p.is_empty()) {
        m.insert("private_parameters".into(), flatten_private_parameters(&params));
    }
    Value::Object(m)
}

pub(crate) fn flatten_origin_group(d: &mut ResourceData, group: OriginGroup) {
    d.set_opt("origin_group_id", group.group_id);
    d.set_opt("name", group.name);
    d.set_opt("type", group.group_type);
    d.set_opt("host_header", group.host_header.filter(|h| !h.is_empty()));
    d.set_opt("create_time", group.create_time);
    d.set_opt("update_time", group.update_time);

    if let Some(records) = group.records {
        let records: Vec<Value> = records.into_iter().map(flatten_origin_record).collect();
        d.set("records", records);
    }

    if let Some(references) = group.references {
        let references: Vec<Value> = references
            .into_iter()
            .map(|r| {
                json!({
                    "instance_type": r.instance_type,
                    "instance_id": r.instance_id,
                    "instance_name": r.instance_name,
                })
            })
            .collect();
        d.set("references", references);
    }
}

#[async_trait]
impl Resource for OriginGroupResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        origin_group_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct CreateOriginGroupResponse {
            origin_group_id: String,
        }

        let request = expand_origin_group(d, None);
        let response: CreateOriginGroupResponse =
            self.service.write("CreateOriginGroup", &request).await?;
        d.set_id(build_id(&[&request.zone_id, &response.origin_group_id]));

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, group_id) = {
            let parts = d.id_parts(2)?;
            (parts[0].to_string(), parts[1].to_string())
        };

        match self.service.describe_origin_group(&zone_id, &group_id).await? {
            Some(group) => {
                d.set("zone_id", zone_id);
                flatten_origin_group(d, group);
            }
            None => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        let group_id = d.id_parts(2)?[1].to_string();

        if d.has_changes(&["name", "type", "records", "host_header"]) {
            let request = expand_origin_group(d, Some(group_id));
            self.service.execute("ModifyOriginGroup", &request).await?;
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let parts = d.id_parts(2)?;
        self.service
            .execute(
                "DeleteOriginGroup",
                &json!({"ZoneId": parts[0], "GroupId": parts[1]}),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, config, object, service};
    use std::sync::Arc;

    fn group_config() -> Value {
        json!({
            "zone_id": "zone-1",
            "name": "web",
            "type": "GENERAL",
            "records": [
                {"record": "1.1.1.1", "type": "IP_DOMAIN", "weight": 40, "private": false},
                {"record": "2.2.2.2", "type": "IP_DOMAIN", "weight": 60, "private": false}
            ]
        })
    }

    #[test]
    fn record_order_does_not_matter() {
        let schema = origin_group_schema();
        let a = config(&schema, group_config());
        let mut reversed = group_config();
        if let Some(records) = reversed["records"].as_array_mut() {
            records.reverse();
        }
        let b = config(&schema, reversed);
        assert_eq!(a.get("records"), b.get("records"));
    }

    #[test]
    fn modify_keeps_record_ids_of_unchanged_records() {
        let schema = origin_group_schema();
        let mut prior = group_config();
        prior["records"][0]["record_id"] = json!("rec-1");
        prior["records"][1]["record_id"] = json!("rec-2");

        let mut next = group_config();
        if let Some(items) = next["records"].as_array_mut() {
            items.push(json!({"record": "3.3.3.3", "type": "IP_DOMAIN", "weight": 10, "private": false}));
        }

        let d = ResourceData::for_update(&schema, "zone-1#og-1", object(prior), object(next));
        let request = expand_origin_group(&d, Some("og-1".into()));

        let ids: HashMap<String, Option<String>> = request
            .records
            .iter()
            .map(|r| (r.record.clone(), r.record_id.clone()))
            .collect();
        assert_eq!(ids["1.1.1.1"].as_deref(), Some("rec-1"));
        assert_eq!(ids["2.2.2.2"].as_deref(), Some("rec-2"));
        assert_eq!(ids["3.3.3.3"], None);
        assert_eq!(request.group_id.as_deref(), Some("og-1"));
    }

    #[test]
    fn flatten_private_record() {
        let group: OriginGroup = serde_json::from_value(json!({
            "GroupId": "og-1",
            "Name": "cos",
            "Type": "GENERAL",
            "Records": [{
                "RecordId": "rec-1", "Record": "bucket.cos.ap-guangzhou.myqcloud.com",
                "Type": "COS", "Weight": null, "Private": true,
                "PrivateParameters": [{"Name": "SecretAccessKey", "Value": "x"}]
            }],
            "References": [{"InstanceType": "AccelerationDomain", "InstanceId": "www.example.com", "InstanceName": "www.example.com"}],
            "HostHeader": ""
        }))
        .unwrap_or_default();

        let mut d = ResourceData::with_id("zone-1#og-1");
        flatten_origin_group(&mut d, group);
        assert_eq!(d.get_str("origin_group_id"), Some("og-1"));
        assert!(d.get("host_header").is_none());
        assert_eq!(
            d.get_list("records")[0]["private_parameters"],
            json!([{"name": "SecretAccessKey", "value": "x"}])
        );
        assert_eq!(d.get_list("references").len(), 1);
    }

    #[tokio::test]
    async fn create_uses_returned_group_id() {
        let transport = Arc::new(
            Scripted::default()
                .reply("CreateOriginGroup", json!({"OriginGroupId": "og-1"}))
                .reply(
                    "DescribeOriginGroup",
                    json!({"OriginGroups": [{"GroupId": "og-1", "Name": "web", "Type": "GENERAL"}], "TotalCount": 1}),
                ),
        );
        let resource = OriginGroupResource::new(service(&transport));
        let mut d = config(&origin_group_schema(), group_config());

        let result = resource.create(&mut d).await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(d.id(), "zone-1#og-1");
        let payload = transport.payload("CreateOriginGroup");
        assert_eq!(payload["Records"].as_array().map(Vec::len), Some(2));
        assert!(payload.get("GroupId").is_none());
    }

    #[tokio::test]
    async fn delete_sends_group_id() {
        let transport = Arc::new(Scripted::default());
        let resource = OriginGroupResource::new(service(&transport));
        let mut d = ResourceData::from_state(&origin_group_schema(), "zone-1#og-1", object(group_config()));
        assert!(resource.delete(&mut d).await.is_ok());
        assert_eq!(
            transport.payload("DeleteOriginGroup"),
            json!({"ZoneId": "zone-1", "GroupId": "og-1"})
        );
    }

    #[tokio::test]
    async fn unchanged_group_is_not_modified() {
        let remote = json!({"OriginGroups": [{
            "GroupId": "og-1",
            "Name": "web",
            "Type": "GENERAL",
            "Records": [
                {"RecordId": "rec-2", "Record": "2.2.2.2", "Type": "IP_DOMAIN", "Weight": 60, "Private": false, "PrivateParameters": []},
                {"RecordId": "rec-1", "Record": "1.1.1.1", "Type": "IP_DOMAIN", "Weight": 40, "Private": false, "PrivateParameters": []}
            ],
            "References": [],
            "HostHeader": "",
            "CreateTime": "2024-06-01T00:00:00Z",
            "UpdateTime": "2024-06-01T00:00:00Z"
        }], "TotalCount": 1});
        let transport = Arc::new(
            Scripted::default()
                .reply("DescribeOriginGroup", remote.clone())
                .reply("DescribeOriginGroup", remote),
        );
        let resource = OriginGroupResource::new(service(&transport));
        let schema = origin_group_schema();

        let mut stored = ResourceData::from_state(&schema, "zone-1#og-1", Map::new());
        assert!(resource.read(&mut stored).await.is_ok());
        let prior = stored.into_state(&schema).unwrap_or_default();

        let next = json!({
            "zone_id": "zone-1",
            "name": "web",
            "type": "GENERAL",
            "records": [
                {"record": "1.1.1.1", "weight": 40},
                {"record": "2.2.2.2", "weight": 60}
            ]
        });
        let mut d = ResourceData::for_update(&schema, "zone-1#og-1", prior, object(next));
        assert!(!d.has_change("records"), "{:?}", d.get("records"));

        assert!(resource.update(&mut d).await.is_ok());
        assert_eq!(transport.actions(), vec!["DescribeOriginGroup", "DescribeOriginGroup"]);
    }
}
