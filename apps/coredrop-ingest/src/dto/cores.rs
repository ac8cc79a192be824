//! DTOs for coredump endpoints

use chrono::{DateTime, Utc};
use coredrop_domain::Coredump;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Response body for a successful upload
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Identity assigned to the upload; names the stored core
    #[schema(example = "01890a5d-ac96-774b-bcce-b302099a8057")]
    pub uid: String,
    /// Success message
    #[schema(example = "Coredump ingested successfully")]
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Identity of the failed upload, for log correlation
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "01890a5d-ac96-774b-bcce-b302099a8057")]
    pub uid: Option<String>,
    /// Error description
    #[schema(example = "Framing error: segment 2 is missing: upload ended early")]
    pub error: String,
}

/// Indexed record of one upload
#[derive(Debug, Serialize, ToSchema)]
pub struct CoredumpResponse {
    pub uid: String,
    /// Capture time reported by the agent
    pub date: Option<DateTime<Utc>>,
    #[schema(example = "h1")]
    pub hostname: String,
    #[schema(example = "/bin/app")]
    pub executable_path: String,
    #[schema(example = "abc123")]
    pub executable_hash: String,
    pub metadata: BTreeMap<String, String>,
    /// Whether the analysis stage processed the core yet
    pub analyzed: bool,
}

impl From<Coredump> for CoredumpResponse {
    fn from(coredump: Coredump) -> Self {
        Self {
            uid: coredump.uid.to_string(),
            date: coredump.date,
            hostname: coredump.hostname,
            executable_path: coredump.executable_path,
            executable_hash: coredump.executable_hash.to_string(),
            metadata: coredump.metadata,
            analyzed: coredump.analyzed,
        }
    }
}
