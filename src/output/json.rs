//! JSON output formatting

use crate::lifecycle::WorkloadStatus;
use serde_json::json;

pub fn format_json(statuses: &[WorkloadStatus]) -> String {
    let data = json!({ "running": statuses });
    serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string())
}
