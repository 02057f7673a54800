//! `tencentcloud_teo_zones`

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::hash::ids_hash;
use crate::resource_data::ResourceData;
use crate::resources::{map_bool, map_str, map_strings};
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::services::teo::types::{AdvancedFilter, Zone};
use crate::traits::DataSource;

use super::{result_output_file_attribute, write_result_output_file};

const DATA_SOURCE: &str = "tencentcloud_teo_zones";

pub struct ZonesDataSource {
    service: TeoService,
}

impl ZonesDataSource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn filter_schema() -> Schema {
    Schema::new()
        .attr(
            "name",
            Attribute::string()
                .required()
                .describe("Filter field: `zone-id`, `zone-name`, `status`, `tag-key`, `tag-value`, `alias-zone-name`..."),
        )
        .attr("values", Attribute::string_list().required().describe("Filter values."))
        .attr(
            "fuzzy",
            Attribute::bool()
                .optional()
                .describe("Whether to match fuzzily, only for `zone-name` and `alias-zone-name`."),
        )
}

fn zone_item_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().computed())
        .attr("zone_name", Attribute::string().computed())
        .attr("alias_zone_name", Attribute::string().computed())
        .attr("type", Attribute::string().computed())
        .attr("area", Attribute::string().computed())
        .attr("status", Attribute::string().computed())
        .attr("active_status", Attribute::string().computed())
        .attr("cname_status", Attribute::string().computed())
        .attr("paused", Attribute::bool().computed())
        .attr("plan_id", Attribute::string().computed())
        .attr("name_servers", Attribute::string_list().computed())
        .attr("tags", Attribute::string_map().computed())
        .attr("created_on", Attribute::string().computed())
        .attr("modified_on", Attribute::string().computed())
}

fn zones_schema() -> Schema {
    Schema::new()
        .attr(
            "filters",
            Attribute::block_list(filter_schema())
                .optional()
                .describe("Filter conditions, up to 20 values per filter. All sites when unset."),
        )
        .attr(
            "order",
            Attribute::string()
                .optional()
                .validate(Validator::AllowedValues(&[
                    "type",
                    "area",
                    "create-time",
                    "zone-name",
                    "use-time",
                    "active-status",
                ]))
                .describe("Sort field."),
        )
        .attr(
            "direction",
            Attribute::string()
                .optional()
                .validate(Validator::AllowedValues(&["asc", "desc"]))
                .describe("Sort direction, `desc` by default."),
        )
        .attr(
            "zones",
            Attribute::block_list(zone_item_schema())
                .computed()
                .describe("Matching sites."),
        )
        .attr("result_output_file", result_output_file_attribute())
}

pub(crate) fn expand_filters(d: &ResourceData) -> Vec<AdvancedFilter> {
    d.get_list("filters")
        .iter()
        .filter_map(Value::as_object)
        .map(|m| AdvancedFilter {
            name: map_str(m, "name").unwrap_or_default().to_string(),
            values: map_strings(m, "values"),
            fuzzy: map_bool(m, "fuzzy"),
        })
        .collect()
}

pub(crate) fn flatten_zone_item(zone: Zone) -> Value {
    let plan_id = zone
        .resources
        .unwrap_or_default()
        .into_iter()
        .find_map(|r| r.plan_id);
    let tags: Map<String, Value> = zone
        .tags
        .unwrap_or_default()
        .into_iter()
        .map(|t| (t.tag_key, Value::String(t.tag_value)))
        .collect();

    json!({
        "zone_id": zone.zone_id,
        "zone_name": zone.zone_name,
        "alias_zone_name": zone.alias_zone_name,
        "type": zone.zone_type,
        "area": zone.area,
        "status": zone.status,
        "active_status": zone.active_status,
        "cname_status": zone.cname_status,
        "paused": zone.paused,
        "plan_id": plan_id,
        "name_servers": zone.name_servers.unwrap_or_default(),
        "tags": tags,
        "created_on": zone.created_on,
        "modified_on": zone.modified_on,
    })
}

#[async_trait]
impl DataSource for ZonesDataSource {
    fn type_name(&self) -> &'static str {
        DATA_SOURCE
    }

    fn schema(&self) -> Schema {
        zones_schema()
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let filters = expand_filters(d);
        let order = d.get_ok_str("order").map(str::to_string);
        let direction = d.get_ok_str("direction").map(str::to_string);

        let zones = self.service.describe_zones(filters, order, direction).await?;

        let ids: Vec<String> = zones
            .iter()
            .filter_map(|z| z.zone_id.clone())
            .collect();
        let items: Vec<Value> = zones.into_iter().map(flatten_zone_item).collect();

        d.set_id(ids_hash(&ids));
        d.set("zones", items.clone());

        if let Some(path) = d.get_ok_str("result_output_file") {
            write_result_output_file(path, &Value::from(items)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, config, service};
    use std::sync::Arc;

    #[tokio::test]
    async fn read_sends_filters_and_sets_hash_id() {
        let transport = Arc::new(Scripted::default().reply(
            "DescribeZones",
            json!({"Zones": [
                {"ZoneId": "zone-1", "ZoneName": "a.com", "Tags": [{"TagKey": "env", "TagValue": "prod"}]},
                {"ZoneId": "zone-2", "ZoneName": "b.com"}
            ], "TotalCount": 2}),
        ));
        let source = ZonesDataSource::new(service(&transport));
        let mut d = config(
            &zones_schema(),
            json!({
                "filters": [{"name": "zone-name", "values": ["a.com", "b.com"], "fuzzy": true}],
                "order": "zone-name",
                "direction": "asc"
            }),
        );

        let result = source.read(&mut d).await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(d.id(), ids_hash(&["zone-1".to_string(), "zone-2".to_string()]));
        assert_eq!(d.get_list("zones").len(), 2);
        assert_eq!(d.get_list("zones")[0]["tags"], json!({"env": "prod"}));

        let payload = transport.payload("DescribeZones");
        assert_eq!(
            payload["Filters"],
            json!([{"Name": "zone-name", "Values": ["a.com", "b.com"], "Fuzzy": true}])
        );
        assert_eq!(payload["Order"], "zone-name");
        assert_eq!(payload["Direction"], "asc");
        assert_eq!(payload["Limit"], 100);
    }

    #[test]
    fn direction_is_validated() {
        let cfg = crate::test_support::object(json!({"direction": "sideways"}));
        assert_eq!(zones_schema().validate(&cfg).len(), 1);
    }
}
