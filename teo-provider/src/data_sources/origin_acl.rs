//! `tencentcloud_teo_origin_acl` data source

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::Result;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};
use crate::services::teo::TeoService;
use crate::services::teo::types::{Addresses, CurrentOriginAcl, NextOriginAcl, OriginAclInfo};
use crate::traits::DataSource;

use super::{result_output_file_attribute, write_result_output_file};

const DATA_SOURCE: &str = "tencentcloud_teo_origin_acl";

pub struct OriginAclDataSource {
    service: TeoService,
}

impl OriginAclDataSource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn addresses_schema() -> Schema {
    Schema::new()
        .attr("ipv4", Attribute::string_list().computed().describe("IPv4 subnets."))
        .attr("ipv6", Attribute::string_list().computed().describe("IPv6 subnets."))
}

fn addresses_attribute(description: &'static str) -> Attribute {
    Attribute::block_list(addresses_schema())
        .computed()
        .describe(description)
}

fn origin_acl_info_schema() -> Schema {
    Schema::new()
        .attr(
            "l7_hosts",
            Attribute::string_list()
                .computed()
                .describe("L7 domains with origin protection enabled."),
        )
        .attr(
            "l4_proxy_ids",
            Attribute::string_list()
                .computed()
                .describe("L4 proxy instances with origin protection enabled."),
        )
        .attr(
            "current_origin_acl",
            Attribute::block_list(
                Schema::new()
                    .attr("entire_addresses", addresses_attribute("Currently effective IP ranges."))
                    .attr("version", Attribute::string().computed())
                    .attr("active_time", Attribute::string().computed())
                    .attr("is_planed", Attribute::string().computed()),
            )
            .computed()
            .describe("Currently effective back-to-origin IP ranges."),
        )
        .attr(
            "next_origin_acl",
            Attribute::block_list(
                Schema::new()
                    .attr("version", Attribute::string().computed())
                    .attr("planned_active_time", Attribute::string().computed())
                    .attr("entire_addresses", addresses_attribute("All IP ranges of the next version."))
                    .attr("added_addresses", addresses_attribute("IP ranges added by the next version."))
                    .attr("removed_addresses", addresses_attribute("IP ranges removed by the next version."))
                    .attr("no_change_addresses", addresses_attribute("IP ranges kept by the next version.")),
            )
            .computed()
            .describe("Back-to-origin IP ranges pending activation, empty when no update is planned."),
        )
        .attr(
            "status",
            Attribute::string()
                .computed()
                .describe("Origin protection status: `online`, `offline` or `updating`."),
        )
}

fn origin_acl_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().required().describe("Site ID."))
        .attr(
            "origin_acl_info",
            Attribute::block_list(origin_acl_info_schema())
                .computed()
                .describe("Origin protection of the site."),
        )
        .attr("result_output_file", result_output_file_attribute())
}

fn flatten_addresses(addresses: Option<Addresses>) -> Value {
    match addresses {
        Some(a) => json!([{
            "ipv4": a.ipv4.unwrap_or_default(),
            "ipv6": a.ipv6.unwrap_or_default(),
        }]),
        None => json!([]),
    }
}

fn flatten_current(current: Option<CurrentOriginAcl>) -> Value {
    match current {
        Some(c) => json!([{
            "entire_addresses": flatten_addresses(c.entire_addresses),
            "version": c.version,
            "active_time": c.active_time,
            "is_planed": c.is_planed,
        }]),
        None => json!([]),
    }
}

fn flatten_next(next: Option<NextOriginAcl>) -> Value {
    match next {
        Some(n) => json!([{
            "version": n.version,
            "planned_active_time": n.planned_active_time,
            "entire_addresses": flatten_addresses(n.entire_addresses),
            "added_addresses": flatten_addresses(n.added_addresses),
            "removed_addresses": flatten_addresses(n.removed_addresses),
            "no_change_addresses": flatten_addresses(n.no_change_addresses),
        }]),
        None => json!([]),
    }
}

pub(crate) fn flatten_origin_acl_info(info: OriginAclInfo) -> Value {
    json!([{
        "l7_hosts": info.l7_hosts.unwrap_or_default(),
        "l4_proxy_ids": info.l4_proxy_ids.unwrap_or_default(),
        "current_origin_acl": flatten_current(info.current_origin_acl),
        "next_origin_acl": flatten_next(info.next_origin_acl),
        "status": info.status,
    }])
}

#[async_trait]
impl DataSource for OriginAclDataSource {
    fn type_name(&self) -> &'static str {
        DATA_SOURCE
    }

    fn schema(&self) -> Schema {
        origin_acl_schema()
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();
        let info = self.service.describe_origin_acl(&zone_id).await?;
        let flattened = info.map_or_else(|| json!([]), flatten_origin_acl_info);

        d.set_id(zone_id);
        d.set("origin_acl_info", flattened.clone());

        if let Some(path) = d.get_ok_str("result_output_file") {
            write_result_output_file(path, &flattened).await?;
        }
        Ok(())
    }
}
