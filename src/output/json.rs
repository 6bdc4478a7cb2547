//! JSON serialization of estimation reports.

use crate::result::EstimationReport;

/// Serialize a report to compact JSON.
pub fn to_json(report: &EstimationReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a report to indented JSON.
pub fn to_json_pretty(report: &EstimationReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
