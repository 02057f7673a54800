//! `tencentcloud_teo_dns_record`

use async_trait::async_trait;
use serde_json::json;

use crate::error::{ProviderError, Result};
use crate::resource_data::{ResourceData, build_id};
use crate::schema::{Attribute, Schema, Validator};
use crate::services::teo::TeoService;
use crate::services::teo::types::DnsRecord;
use crate::traits::Resource;

use super::mark_gone;

const RESOURCE: &str = "tencentcloud_teo_dns_record";

const RECORD_TYPES: &[&str] = &["A", "AAAA", "MX", "CNAME", "TXT", "NS", "CAA", "SRV"];

pub struct DnsRecordResource {
    service: TeoService,
}

impl DnsRecordResource {
    pub fn new(service: TeoService) -> Self {
        Self { service }
    }
}

fn dns_record_schema() -> Schema {
    Schema::new()
        .attr("zone_id", Attribute::string().required().force_new().describe("Site ID."))
        .attr(
            "name",
            Attribute::string()
                .required()
                .describe("DNS record name. Chinese domain names must be in punycode."),
        )
        .attr(
            "type",
            Attribute::string()
                .required()
                .validate(Validator::AllowedValues(RECORD_TYPES))
                .describe("DNS record type."),
        )
        .attr(
            "content",
            Attribute::string()
                .required()
                .validate(Validator::NotEmpty)
                .describe("DNS record content, matching the record type."),
        )
        .attr(
            "location",
            Attribute::string()
                .optional()
                .computed()
                .describe("Resolution line, `Default` when unset. Only for A, AAAA and CNAME."),
        )
        .attr(
            "ttl",
            Attribute::int()
                .optional()
                .computed()
                .validate(Validator::IntBetween(60, 86400))
                .describe("Cache time in seconds, 300 by default."),
        )
        .attr(
            "weight",
            Attribute::int()
                .optional()
                .computed()
                .validate(Validator::IntBetween(-1, 100))
                .describe("Record weight, -1 disables weighting. Only for A, AAAA and CNAME."),
        )
        .attr(
            "priority",
            Attribute::int()
                .optional()
                .computed()
                .validate(Validator::IntBetween(0, 50))
                .describe("MX record priority, smaller is preferred."),
        )
        .attr(
            "status",
            Attribute::string()
                .optional()
                .computed()
                .validate(Validator::AllowedValues(&["enable", "disable"]))
                .describe("Record status."),
        )
        .attr("record_id", Attribute::string().computed().describe("DNS record ID."))
        .attr("created_on", Attribute::string().computed().describe("Creation time."))
        .attr("modified_on", Attribute::string().computed().describe("Modification time."))
}

/// Record body shared by create and modify.
pub(crate) fn expand_dns_record(d: &ResourceData) -> Result<DnsRecord> {
    let record_type = d.get_str("type").unwrap_or_default().to_string();
    let priority = match d.get_i64("priority") {
        Some(p) if record_type == "MX" => Some(p),
        // 非 MX 记录回读的 priority 为 0
        Some(p) if p != 0 => {
            return Err(ProviderError::Validation {
                resource: RESOURCE.to_string(),
                diagnostics: vec![format!(
                    "priority: only supported for MX records, got type \"{record_type}\""
                )],
            });
        }
        _ => None,
    };

    Ok(DnsRecord {
        name: d.get_str("name").map(str::to_string),
        record_type: Some(record_type),
        content: d.get_str("content").map(str::to_string),
        location: d.get_ok_str("location").map(str::to_string),
        ttl: d.get_i64("ttl"),
        weight: d.get_i64("weight"),
        priority,
        ..Default::default()
    })
}

pub(crate) fn flatten_dns_record(d: &mut ResourceData, record: DnsRecord) {
    d.set_opt("zone_id", record.zone_id);
    d.set_opt("record_id", record.record_id);
    d.set_opt("name", record.name);
    d.set_opt("type", record.record_type);
    d.set_opt("content", record.content);
    d.set_opt("location", record.location);
    d.set_opt("ttl", record.ttl);
    d.set_opt("weight", record.weight);
    d.set_opt("priority", record.priority);
    d.set_opt("status", record.status);
    d.set_opt("created_on", record.created_on);
    d.set_opt("modified_on", record.modified_on);
}

impl DnsRecordResource {
    async fn modify_status(&self, zone_id: &str, record_id: &str, status: &str) -> Result<()> {
        let key = if status == "disable" {
            "RecordsToDisable"
        } else {
            "RecordsToEnable"
        };
        self.service
            .execute(
                "ModifyDnsRecordsStatus",
                &json!({"ZoneId": zone_id, key: [record_id]}),
            )
            .await
    }
}

#[async_trait]
impl Resource for DnsRecordResource {
    fn type_name(&self) -> &'static str {
        RESOURCE
    }

    fn schema(&self) -> Schema {
        dns_record_schema()
    }

    async fn create(&self, d: &mut ResourceData) -> Result<()> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct CreateDnsRecordResponse {
            record_id: String,
        }

        let zone_id = d.get_str("zone_id").unwrap_or_default().to_string();
        let mut request = expand_dns_record(d)?;
        request.zone_id = Some(zone_id.clone());

        let response: CreateDnsRecordResponse =
            self.service.write("CreateDnsRecord", &request).await?;
        d.set_id(build_id(&[&zone_id, &response.record_id]));

        // 新建记录默认启用
        if d.get_str("status") == Some("disable") {
            self.modify_status(&zone_id, &response.record_id, "disable")
                .await?;
        }

        self.read(d).await
    }

    async fn read(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, record_id) = {
            let parts = d.id_parts(2)?;
            (parts[0].to_string(), parts[1].to_string())
        };

        match self.service.describe_dns_record(&zone_id, &record_id).await? {
            Some(mut record) => {
                record.zone_id.get_or_insert(zone_id);
                flatten_dns_record(d, record);
            }
            None => mark_gone(d, RESOURCE),
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData) -> Result<()> {
        let (zone_id, record_id) = {
            let parts = d.id_parts(2)?;
            (parts[0].to_string(), parts[1].to_string())
        };

        if d.has_changes(&["name", "type", "content", "location", "ttl", "weight", "priority"]) {
            let mut record = expand_dns_record(d)?;
            record.record_id = Some(record_id.clone());
            self.service
                .execute(
                    "ModifyDnsRecords",
                    &json!({"ZoneId": zone_id, "DnsRecords": [record]}),
                )
                .await?;
        }

        if d.has_change("status") {
            if let Some(status) = d.get_ok_str("status").map(str::to_string) {
                self.modify_status(&zone_id, &record_id, &status).await?;
            }
        }

        self.read(d).await
    }

    async fn delete(&self, d: &mut ResourceData) -> Result<()> {
        let parts = d.id_parts(2)?;
        self.service
            .execute(
                "DeleteDnsRecords",
                &json!({"ZoneId": parts[0], "RecordIds": [parts[1]]}),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Scripted, config, object, service};
    use serde_json::Value;
    use std::sync::Arc;

    fn a_record() -> Value {
        json!({
            "zone_id": "zone-1",
            "name": "www.example.com",
            "type": "A",
            "content": "1.2.3.4",
            "ttl": 300
        })
    }

    #[test]
    fn schema_checks_ranges() {
        let mut cfg = object(a_record());
        cfg.insert("ttl".into(), json!(30));
        cfg.insert("weight".into(), json!(101));
        let diags = dns_record_schema().validate(&cfg);
        assert_eq!(diags.len(), 2, "{diags:?}");
    }

    #[test]
    fn priority_only_for_mx() {
        let mut cfg = a_record();
        cfg["priority"] = json!(10);
        let d = config(&dns_record_schema(), cfg.clone());
        assert!(matches!(expand_dns_record(&d), Err(ProviderError::Validation { .. })));

        cfg["type"] = json!("MX");
        let d = config(&dns_record_schema(), cfg);
        let record = expand_dns_record(&d).ok().unwrap_or_default();
        assert_eq!(record.priority, Some(10));
    }

    #[test]
    fn zero_priority_read_back_is_ignored() {
        let mut cfg = a_record();
        cfg["priority"] = json!(0);
        let d = config(&dns_record_schema(), cfg);
        let record = expand_dns_record(&d).ok().unwrap_or_default();
        assert_eq!(record.priority, None);
    }

    #[tokio::test]
    async fn create_disabled_record() {
        let mut cfg = a_record();
        cfg["status"] = json!("disable");
        let transport = Arc::new(
            Scripted::default()
                .reply("CreateDnsRecord", json!({"RecordId": "record-1"}))
                .reply(
                    "DescribeDnsRecords",
                    json!({"DnsRecords": [{
                        "ZoneId": "zone-1", "RecordId": "record-1", "Name": "www.example.com",
                        "Type": "A", "Content": "1.2.3.4", "TTL": 300, "Status": "disable",
                        "Location": "Default", "Weight": -1, "Priority": 0
                    }]}),
                ),
        );
        let resource = DnsRecordResource::new(service(&transport));
        let mut d = config(&dns_record_schema(), cfg);

        let result = resource.create(&mut d).await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(d.id(), "zone-1#record-1");
        assert_eq!(d.get_str("location"), Some("Default"));
        assert_eq!(
            transport.actions(),
            vec!["CreateDnsRecord", "ModifyDnsRecordsStatus", "DescribeDnsRecords"]
        );
        assert_eq!(
            transport.payload("CreateDnsRecord"),
            json!({"ZoneId": "zone-1", "Name": "www.example.com", "Type": "A", "Content": "1.2.3.4", "TTL": 300})
        );
        assert_eq!(
            transport.payload("ModifyDnsRecordsStatus"),
            json!({"ZoneId": "zone-1", "RecordsToDisable": ["record-1"]})
        );
        assert_eq!(
            transport.payload("DescribeDnsRecords"),
            json!({"ZoneId": "zone-1", "Filters": [{"Name": "id", "Values": ["record-1"]}]})
        );
    }

    #[tokio::test]
    async fn update_status_only() {
        let schema = dns_record_schema();
        let mut prior = a_record();
        prior["status"] = json!("enable");
        let mut next = a_record();
        next["status"] = json!("disable");
        let transport = Arc::new(Scripted::default());
        let resource = DnsRecordResource::new(service(&transport));
        let mut d = ResourceData::for_update(&schema, "zone-1#record-1", object(prior), object(next));

        assert!(resource.update(&mut d).await.is_ok());
        assert_eq!(transport.actions(), vec!["ModifyDnsRecordsStatus", "DescribeDnsRecords"]);
    }

    #[tokio::test]
    async fn broken_id_is_rejected() {
        let transport = Arc::new(Scripted::default());
        let resource = DnsRecordResource::new(service(&transport));
        let mut d = ResourceData::with_id("zone-1");
        let result = resource.read(&mut d).await;
        assert!(matches!(result, Err(ProviderError::BrokenId { .. })));
        assert!(transport.actions().is_empty());
    }
}
