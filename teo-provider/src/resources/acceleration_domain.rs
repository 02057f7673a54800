//! `tencentcloud_teo_acceleration_domain`

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::{ProviderError, Result};
use crate::resource_data::{ResourceData, build_id};
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::services::teo::types::{AccelerationDomain, AccelerationDomainRequest, OriginInfo};
use crate::traits::Resource;

use super::{
    expand_private_parameters, flatten_private_parameters, map_ok_str, map_str, mark_gone,
    private_parameter_schema,
};

const RESOURCE: &str = "tencentcloud_teo_acceleration_domain";

/// Arguments sent by `ModifyAccelerationDomain`.
const MUTABLE_ARGS: &[&str] = &[
    "origin_info",
    "origin_protocol",
    "http_origin_port",
    "https_origin_port",
    "ipv6_status",
];

pub struct AccelerationDomainResource {
    service: TeoService,
}

impl AccelerationDomainResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn origin_info_schema() -> Schema {
    Schema::new()
        .attr(
            "origin_type",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(&[
                    "IP_DOMAIN",
                    "COS",
                    "ORIGIN_GROUP",
                    "AWS_S3",
                    "LB",
                    "SPACE",
                    "VOD",
                ]))
                .describe("Origin type."),
        )
        .attr(
            "origin",
            Attribute::string()
                .required()
                .describe("Origin address: IP/domain, bucket domain or origin group ID depending on `origin_type`."),
        )
        .attr(
            "backup_origin",
            Attribute::string()
                .optional()
                .describe("Backup origin group ID, only for `ORIGIN_GROUP` origins."),
        )
        .attr(
            "private_access",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["on", "off"]))
                .describe("Whether to access a private COS/S3 bucket."),
        )
        .attr(
            "private_parameters",
            Attribute::block_list(private_parameter_schema())
                .optional()
                .describe("Private authentication parameters, only when `private_access` is `on`."),
        )
        .attr(
            "host_header",
            Attribute::string()
                .optional()
                .computed()
                .describe("Custom back-to-origin Host header, only for `IP_DOMAIN` origins."),
        )
        .attr(
            "vod_origin_scope",
            Attribute::string()
                .optional()
                .validate(Validator::AllowedValues(&["all", "bucket"]))
                .describe("VOD origin scope, only for `VOD` origins."),
        )
        .attr(
            "vod_bucket_id",
            Attribute::string()
                .optional()
                .describe("VOD bucket ID, required when `vod_origin_scope` is `bucket`."),
        )
}

fn acceleration_domain_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().required().force_new().describe("Site ID."))
        .attr(
            "domain_name",
            Attribute::string()
                .required()
                .force_new()
                .describe("Accelerated domain name."),
        )
        .attr(
            "origin_info",
            Attribute::block_list(origin_info_schema())
                .required()
                .max_items(1)
                .describe("Origin configuration of the domain."),
        )
        .attr(
            "status",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["online", "offline"]))
                .describe("Domain status."),
        )
        .attr(
            "origin_protocol",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["FOLLOW", "HTTP", "HTTPS"]))
                .describe("Back-to-origin protocol."),
        )
        .attr(
            "http_origin_port",
            Attribute::int()
                .optional()
                .computed()
                .validate(Validator::IntBetween(1, 65535))
                .describe("HTTP back-to-origin port."),
        )
        .attr(
            "https_origin_port",
            Attribute::int()
                .optional()
                .computed()
                .validate(Validator::IntBetween(1, 65535))
                .describe("HTTPS back-to-origin port. Cannot be changed after creation."),
        )
        .attr(
            "ipv6_status",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["follow", "on", "off"]))
                .describe("IPv6 access status."),
        )
        .attr("cname", Attribute::string().computed().describe("CNAME target of the domain."))
}

/// `origin_info` block to `OriginInfo`.
///
/// `host_header` is only meaningful for `IP_DOMAIN` origins: `strict` rejects
/// it on other types, otherwise it is dropped.
pub(crate) fn expand_origin_info(m: &Map<String, Value>, strict: bool) -> Result<OriginInfo> {
    let origin_type = map_str(m, "origin_type").unwrap_or_default().to_string();
    let mut host_header = map_ok_str(m, "host_header");
    if host_header.is_some() && origin_type != "IP_DOMAIN" {
        if strict {
            return Err(ProviderError::Validation {
                resource: RESOURCE.to_string(),
                diagnostics: vec![format!(
                    "origin_info.0.host_header: only supported when origin_type is IP_DOMAIN, got \"{origin_type}\""
                )],
            });
        }
        host_header = None;
    }

    Ok(OriginInfo {
        origin_type,
        origin: map_str(m, "origin").unwrap_or_default().to_string(),
        backup_origin: map_ok_str(m, "backup_origin"),
        private_access: map_ok_str(m, "private_access"),
        private_parameters: expand_private_parameters(m),
        host_header,
        vod_origin_scope: map_ok_str(m, "vod_origin_scope"),
        vod_bucket_id: map_ok_str(m, "vod_bucket_id"),
    })
}

pub(crate) fn expand_acceleration_domain(d: &ResourceData, strict: bool) -> Result<AccelerationDomainRequest> {
    let origin_info = d
        .head_map("origin_info")
        .map(|m| expand_origin_info(m, strict))
        .transpose()?;

    Ok(AccelerationDomainRequest {
        zone_id: d.get_str("zone_id").unwrap_or_default().to_string(),
        domain_name: d.get_str("domain_name").unwrap_or_default().to_string(),
        origin_info,
        origin_protocol: d.get_ok_str("origin_protocol").map(str::to_string),
        http_origin_port: d.get_i64("http_origin_port").filter(|p| *p != 0),
        https_origin_port: d.get_i64("https_origin_port").filter(|p| *p != 0),
        ipv6_status: d.get_ok_str("ipv6_status").map(str::to_string),
    })
}

pub(crate) fn flatten_origin_info(origin: OriginInfo) -> Value {
    let mut m = Map::new();
    m.insert("origin_type".into(), json!(origin.origin_type));
    m.insert("origin".into(), json!(origin.origin));
    // 未设置的可选项接口返回空串
    let optional = [
        ("backup_origin", origin.backup_origin),
        ("private_access", origin.private_access),
        ("host_header", origin.host_header),
        ("vod_origin_scope", origin.vod_origin_scope),
        ("vod_bucket_id", origin.vod_bucket_id),
    ];
    for (key, value) in optional {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            m.insert(key.into(), json!(v));
        }
    }
    if let Some(params) = origin.private_parameters.filter(|p| !p.is_empty()) {
        m.insert("private_parameters".into(), flatten_private_parameters(&params));
    }
    Value::Object(m)
}

pub(crate) fn flatten_acceleration_domain(d: &mut ResourceData, domain: AccelerationDomain) {
    d.set_opt("zone_id", domain.zone_id);
    d.set_opt("domain_name", domain.domain_name);
    d.set_opt("status", domain.domain_status);
    d.set_opt("origin_protocol", domain.origin_protocol);
    d.set_opt("http_origin_port", domain.http_origin_port);
    d.set_opt("https_origin_port", domain.https_origin_port);
    d.set_opt("ipv6_status", domain.ipv6_status);
    d.set_opt("cname", domain.cname);
    if let Some(origin) = domain.origin_detail {
        d.set("origin_info", json!([flatten_origin_info(origin)]));
    }
}

impl AccelerationDomainResource {
    async fn set_status(&self, zone_id: &str, domain_name: &str, status: &str) -> Result<()> {
        self.service
            .execute(
                "ModifyAccelerationDomainStatuses",
                &json!({"ZoneId": zone_id, "DomainNames": [domain_name], "Status": status}),
            )
            .await?;
        self.service
            .wait_acceleration_domain_status(zone_id, domain_name, status)
            .await
    }
}

#[async_trait]
impl Resource for AccelerationDomainResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        acceleration_domain_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        let request = expand_acceleration_domain(d, true)?;
        self.service
            .execute("CreateAccelerationDomain", &request)
            .await?;
        d.set_id(build_id(&[&request.zone_id, &request.domain_name]));

        self.service
            .wait_acceleration_domain_status(&request.zone_id, &request.domain_name, "online")
            .await?;

        if d.get_str("status") == Some("offline") {
            self.set_status(&request.zone_id, &request.domain_name, "offline")
                .await?;
        }

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, domain_name) = {
            let parts = d.id_parts(2)?;
            (parts[0].to_string(), parts[1].to_string())
        };

        match self
            .service
            .describe_acceleration_domain(&zone_id, &domain_name)
            .await?
        {
            Some(domain) => {
                d.set("zone_id", zone_id);
                d.set("domain_name", domain_name);
                flatten_acceleration_domain(d, domain);
            }
            None => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        d.ensure_unchanged(RESOURCE, &["https_origin_port"])?;
        let (zone_id, domain_name) = {
            let parts = d.id_parts(2)?;
            (parts[0].to_string(), parts[1].to_string())
        };

        if d.has_changes(MUTABLE_ARGS) {
            let mut request = expand_acceleration_domain(d, false)?;
            request.zone_id = zone_id.clone();
            request.domain_name = domain_name.clone();
            self.service
                .execute("ModifyAccelerationDomain", &request)
                .await?;
        }

        if d.has_change("status") {
            if let Some(status) = d.get_ok_str("status").map(str::to_string) {
                self.set_status(&zone_id, &domain_name, &status).await?;
            }
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, domain_name) = {
            let parts = d.id_parts(2)?;
            (parts[0].to_string(), parts[1].to_string())
        };

        // 在线域名需先下线才能删除
        let current = self
            .service
            .describe_acceleration_domain(&zone_id, &domain_name)
            .await?;
        if let Some(domain) = current {
            if domain.domain_status.as_deref() != Some("offline") {
                self.set_status(&zone_id, &domain_name, "offline").await?;
            }
        }

        self.service
            .execute(
                "DeleteAccelerationDomains",
                &json!({"ZoneId": zone_id, "DomainNames": [domain_name]}),
            )
            .await
    }
}
