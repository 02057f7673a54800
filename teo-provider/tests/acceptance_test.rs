//! EdgeOne 集成测试（真实 API）
//!
//! 运行方式:
//! ```bash
//! TENCENTCLOUD_SECRET_ID=xxx TENCENTCLOUD_SECRET_KEY=xxx TENCENTCLOUD_TEO_ZONE_ID=zone-xxx \
//!     cargo test -p teo-provider --test acceptance_test -- --ignored --nocapture --test-threads=1
//! ```

mod common;

use common::{TestContext, generate_test_name, state};
use serde_json::json;

const CREDENTIAL_VARS: [&str; 3] = [
    "TENCENTCLOUD_SECRET_ID",
    "TENCENTCLOUD_SECRET_KEY",
    "TENCENTCLOUD_TEO_ZONE_ID",
];

// ============ 数据源 ============

#[tokio::test]
#[ignore]
async fn test_teo_zones_data_source() {
    skip_if_no_credentials!(CREDENTIAL_VARS[0], CREDENTIAL_VARS[1], CREDENTIAL_VARS[2]);

    let ctx = require_some!(TestContext::teo(), "创建测试上下文失败");
    let config = json!({"filters": [{"name": "zone-id", "values": [ctx.zone_id]}]});

    let result = require_ok!(
        ctx.provider
            .read_data_source("tencentcloud_teo_zones", state(config))
            .await,
        "读取 zones 数据源失败"
    );
    let zones = require_some!(result["zones"].as_array(), "zones 应为列表");
    assert_eq!(zones.len(), 1, "应只匹配测试站点");
    assert_eq!(zones[0]["zone_id"], ctx.zone_id.as_str());

    println!("✓ zones 数据源测试通过: {}", zones[0]["zone_name"]);
}

// ============ DNS 记录 ============

#[tokio::test]
#[ignore]
async fn test_teo_dns_record_lifecycle() {
    skip_if_no_credentials!(CREDENTIAL_VARS[0], CREDENTIAL_VARS[1], CREDENTIAL_VARS[2]);

    let ctx = require_some!(TestContext::teo(), "创建测试上下文失败");
    let zone = require_ok!(ctx.provider.import("tencentcloud_teo_zone", &ctx.zone_id).await);
    let zone_name = zone["zone_name"].as_str().unwrap_or_default().to_string();
    let name = format!("{}.{zone_name}", generate_test_name());

    let config = json!({
        "zone_id": ctx.zone_id,
        "name": name,
        "type": "A",
        "content": "192.0.2.1",
        "ttl": 300
    });
    let created = require_ok!(
        ctx.provider
            .create("tencentcloud_teo_dns_record", state(config.clone()))
            .await,
        "创建 DNS 记录失败"
    );
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let mut next = config;
    next["content"] = json!("192.0.2.2");
    let updated = ctx
        .provider
        .update("tencentcloud_teo_dns_record", &id, created.clone(), state(next))
        .await;

    let read = ctx
        .provider
        .read("tencentcloud_teo_dns_record", &id, created)
        .await;
    ctx.cleanup("tencentcloud_teo_dns_record", &id).await;

    let updated = require_some!(require_ok!(updated, "更新 DNS 记录失败"));
    assert_eq!(updated["content"], "192.0.2.2");
    let read = require_some!(require_ok!(read, "读取 DNS 记录失败"));
    assert_eq!(read["content"], "192.0.2.2");

    println!("✓ DNS 记录生命周期测试通过: {id}");
}

// ============ 源站组 ============

#[tokio::test]
#[ignore]
async fn test_teo_origin_group_lifecycle() {
    skip_if_no_credentials!(CREDENTIAL_VARS[0], CREDENTIAL_VARS[1], CREDENTIAL_VARS[2]);

    let ctx = require_some!(TestContext::teo(), "创建测试上下文失败");
    let config = json!({
        "zone_id": ctx.zone_id,
        "name": generate_test_name(),
        "type": "GENERAL",
        "records": [
            {"record": "192.0.2.10", "type": "IP_DOMAIN", "weight": 50},
            {"record": "192.0.2.11", "type": "IP_DOMAIN", "weight": 50}
        ]
    });
    let created = require_ok!(
        ctx.provider
            .create("tencentcloud_teo_origin_group", state(config))
            .await,
        "创建源站组失败"
    );
    let id = created["id"].as_str().unwrap_or_default().to_string();
    let records = created["records"].as_array().map_or(0, Vec::len);
    ctx.cleanup("tencentcloud_teo_origin_group", &id).await;

    assert_eq!(records, 2);
    println!("✓ 源站组生命周期测试通过: {id}");
}
