//! EdgeOne data sources.

mod origin_acl;
mod zones;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{ProviderError, Result};
use crate::schema::Attribute;
use crate::services::teo::TeoService;
use crate::traits::DataSource;

pub use origin_acl::OriginAclDataSource;
pub use zones::ZonesDataSource;

/// Every data source backed by `service`.
pub fn all(service: &TeoService) -> Vec<Arc<dyn DataSource>> {
    vec![
        Arc::new(ZonesDataSource::new(service.clone())),
        Arc::new(OriginAclDataSource::new(service.clone())),
    ]
}

pub(crate) fn result_output_file_attribute() -> Attribute {
    Attribute::string()
        .optional()
        .describe("Used to save results.")
}

/// Write `result` to `path` as pretty JSON.
pub(crate) async fn write_result_output_file(path: &str, result: &Value) -> Result<()> {
    let io_error = |detail: String| ProviderError::Io {
        path: path.to_string(),
        detail,
    };
    let body = serde_json::to_string_pretty(result).map_err(|e| io_error(e.to_string()))?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| io_error(e.to_string()))?;
    log::debug!("result written to [{path}]");
    Ok(())
}
