//! Output formatting

use crate::lifecycle::WorkloadStatus;
use crate::output::human::format_human;
use crate::output::json::format_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub fn format_status(statuses: &[WorkloadStatus], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(statuses),
        OutputFormat::Json => format_json(statuses),
    }
}
