pub mod allocator;
pub mod hero;
pub mod http;
pub mod zero;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::pipeline::PipelineError;

use self::http::{error_response, ApiGatewayResponse};

/// Run summary returned by the snapshot handlers. Counts are explicit so a
/// caller can see failed companies without re-reading the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub status: String,
    pub vendor: String,
    pub snapshot_object: String,
    pub total_companies: usize,
    pub processed: usize,
    pub errors: usize,
    pub drivers: usize,
    pub fingerprint: String,
    pub execution_time_ms: u128,
}

pub(crate) fn pipeline_error_response(error: &PipelineError) -> ApiGatewayResponse {
    let (status_code, kind) = match error {
        PipelineError::Validation(_) => (400, "validation_error"),
        PipelineError::Retry(_) => (500, "upstream_error"),
        PipelineError::Store(_) => (500, "persistence_error"),
        PipelineError::Timeout { .. } => (500, "timeout"),
        PipelineError::Internal(_) => (500, "internal_error"),
    };
    error_response(
        status_code,
        json!({
            "error": kind,
            "message": error.to_string(),
        }),
    )
}
