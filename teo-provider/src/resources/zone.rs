//! `tencentcloud_teo_zone`

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::services::teo::types::{CreateZoneRequest, ModifyZoneRequest, Tag, Zone};
use crate::traits::Resource;

use super::mark_gone;

const RESOURCE: &str = "tencentcloud_teo_zone";

pub struct ZoneResource {
    service: TeoService,
}

impl ZoneResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn dns_verification_schema() -> Schema {
    Schema::new()
        .attr("subdomain", Attribute::string().computed().describe("Host record."))
        .attr("record_type", Attribute::string().computed().describe("Record type."))
        .attr("record_value", Attribute::string().computed().describe("Record value."))
}

fn zone_schema() -> Schema {
    Schema::new()
        .attr(
            "zone_name",
            Attribute::string()
                .required()
                .force_new()
                .describe("Site name, the root domain when accessing via CNAME/NS."),
        )
        .attr(
            "type",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(&["partial", "full", "noDomainAccess"]))
                .describe("Site access type: `partial` (CNAME), `full` (NS) or `noDomainAccess`."),
        )
        .attr(
            "area",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(&["global", "mainland", "overseas"]))
                .describe("Acceleration region of the L7 domains under the site."),
        )
        .attr(
            "plan_id",
            Attribute::string()
                .required()
                .force_new()
                .describe("ID of the plan the site is bound to."),
        )
        .attr(
            "alias_zone_name",
            Attribute::string()
                .optional()
                .describe("Alias site identifier, letters, digits, `-`, `_` and `.`, up to 200 characters."),
        )
        .attr(
            "paused",
            Attribute::bool()
                .optional()
                .computed()
                .describe("Whether the site is disabled."),
        )
        .attr(
            "tags",
            Attribute::string_map()
                .optional()
                .force_new()
                .describe("Tags of the site, bound at creation."),
        )
        .attr("zone_id", Attribute::string().computed().describe("Site ID."))
        .attr(
            "status",
            Attribute::string()
                .computed()
                .describe("Site status: `active`, `pending`, `moved` or `deactivated`."),
        )
        .attr(
            "active_status",
            Attribute::string()
                .computed()
                .describe("Running status: `active`, `inactive` or `paused`."),
        )
        .attr(
            "cname_status",
            Attribute::string()
                .computed()
                .describe("Ownership verification status of CNAME access: `finished` or `pending`."),
        )
        .attr(
            "name_servers",
            Attribute::string_list()
                .computed()
                .describe("NS servers assigned to the site."),
        )
        .attr(
            "ownership_verification",
            Attribute::block_list(
                Schema::new().attr(
                    "dns_verification",
                    Attribute::block_list(dns_verification_schema()).computed(),
                ),
            )
            .computed()
            .describe("Ownership verification details for CNAME access."),
        )
}

pub(crate) fn expand_create_zone(d: &ResourceData) -> CreateZoneRequest {
    let tags = d
        .get("tags")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .map(|(k, v)| Tag {
                    tag_key: k.clone(),
                    tag_value: v.as_str().unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    CreateZoneRequest {
        zone_type: d.get_str("type").unwrap_or_default().to_string(),
        zone_name: d.get_str("zone_name").unwrap_or_default().to_string(),
        area: d.get_str("area").unwrap_or_default().to_string(),
        plan_id: d.get_str("plan_id").unwrap_or_default().to_string(),
        alias_zone_name: d.get_ok_str("alias_zone_name").map(str::to_string),
        tags,
    }
}

/// Only the changed arguments are sent.
pub(crate) fn expand_modify_zone(d: &ResourceData) -> Option<ModifyZoneRequest> {
    if !d.has_changes(&["type", "alias_zone_name", "area"]) {
        return None;
    }
    let changed = |key: &str| {
        d.has_change(key)
            .then(|| d.get_str(key).unwrap_or_default().to_string())
    };
    Some(ModifyZoneRequest {
        zone_id: d.id().to_string(),
        zone_type: changed("type"),
        alias_zone_name: changed("alias_zone_name"),
        area: changed("area"),
    })
}

pub(crate) fn flatten_zone(d: &mut ResourceData, zone: Zone) {
    d.set_opt("zone_id", zone.zone_id);
    d.set_opt("zone_name", zone.zone_name);
    d.set_opt("type", zone.zone_type);
    d.set_opt("area", zone.area);
    d.set_opt("alias_zone_name", zone.alias_zone_name);
    d.set_opt("paused", zone.paused);
    d.set_opt("status", zone.status);
    d.set_opt("active_status", zone.active_status);
    d.set_opt("cname_status", zone.cname_status);
    d.set_opt("name_servers", zone.name_servers);

    if let Some(plan_id) = zone
        .resources
        .unwrap_or_default()
        .into_iter()
        .find_map(|r| r.plan_id.filter(|p| !p.is_empty()))
    {
        d.set("plan_id", plan_id);
    }

    if let Some(tags) = zone.tags {
        let tags: Map<String, Value> = tags
            .into_iter()
            .map(|t| (t.tag_key, Value::String(t.tag_value)))
            .collect();
        d.set("tags", tags);
    }

    if let Some(dns) = zone.ownership_verification.and_then(|o| o.dns_verification) {
        d.set(
            "ownership_verification",
            json!([{
                "dns_verification": [{
                    "subdomain": dns.subdomain,
                    "record_type": dns.record_type,
                    "record_value": dns.record_value,
                }]
            }]),
        );
    }
}

#[async_trait]
impl Resource for ZoneResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        zone_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct CreateZoneResponse {
            zone_id: String,
        }

        let request = expand_create_zone(d);
        let response: CreateZoneResponse = self.service.write("CreateZone", &request).await?;
        d.set_id(response.zone_id.clone());

        if d.get_bool("paused") == Some(true) {
            self.service
                .modify_zone_status(&response.zone_id, true, false)
                .await?;
        }

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let zone_id = d.id().to_string();
        match self.service.describe_zone(&zone_id).await? {
            Some(zone) => flatten_zone(d, zone),
            None => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        d.ensure_unchanged(RESOURCE, &["zone_name", "plan_id", "tags"])?;
        let zone_id = d.id().to_string();

        if let Some(request) = expand_modify_zone(d) {
            self.service.execute("ModifyZone", &request).await?;
        }

        if d.has_change("paused") {
            let paused = d.get_bool("paused").unwrap_or(false);
            self.service.modify_zone_status(&zone_id, paused, false).await?;
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let zone_id = d.id().to_string();
        // 删除前站点必须处于停用状态
        self.service.modify_zone_status(&zone_id, true, true).await?;
        self.service
            .execute("DeleteZone", &json!({"ZoneId": zone_id}))
            .await
    }
}
