//! Domain entities for upload ingestion
//!
//! An upload starts with an [`UploadHeader`] describing the crash, and ends
//! with a [`Coredump`] record handed to the downstream index once both
//! artifacts are safely stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ingestion::ids::{CoredumpId, ExecutableHash};

/// The first segment of an upload: metadata about the captured crash
///
/// Field names are snake_case on the wire; the camelCase spellings sent by
/// some agents are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadHeader {
    /// When the core was captured on the host
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    /// Host the crash happened on
    pub hostname: String,

    /// Path of the crashed executable at capture time
    #[serde(alias = "executablePath")]
    pub executable_path: String,

    /// Content hash of the executable, names the stored executable
    #[serde(alias = "executableHash")]
    pub executable_hash: ExecutableHash,

    /// Free-form key/value annotations from the agent
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Metadata record submitted to the index for one ingested upload
///
/// Created once at the end of a successful pipeline run. `analyzed` starts
/// false and is flipped by the analysis stage, never by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coredump {
    pub uid: CoredumpId,
    pub date: Option<DateTime<Utc>>,
    pub hostname: String,
    pub executable_path: String,
    pub executable_hash: ExecutableHash,
    pub metadata: BTreeMap<String, String>,
    pub analyzed: bool,
}

impl Coredump {
    /// Build the record for an upload whose artifacts are stored
    pub fn new(uid: CoredumpId, header: UploadHeader) -> Self {
        Self {
            uid,
            date: header.date,
            hostname: header.hostname,
            executable_path: header.executable_path,
            executable_hash: header.executable_hash,
            metadata: header.metadata,
            analyzed: false,
        }
    }
}
