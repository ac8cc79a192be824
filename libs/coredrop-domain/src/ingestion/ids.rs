use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ingestion::error::IngestionError;

/// Longest executable hash accepted in an upload header
pub const MAX_HASH_LEN: usize = 128;

/// Unique identifier of one upload request
///
/// CoredumpId is a wrapper around UUID v7 to provide type safety and prevent
/// mixing up request identities with other UUIDs in the system. It addresses
/// the stored core image and correlates logs and errors of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoredumpId(Uuid);

impl CoredumpId {
    /// Generate a new CoredumpId
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the inner UUID value
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CoredumpId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CoredumpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CoredumpId {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|err| IngestionError::invalid_id(format!("'{}' is not a core uid: {}", s, err)))
    }
}

impl From<Uuid> for CoredumpId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CoredumpId> for Uuid {
    fn from(id: CoredumpId) -> Self {
        id.0
    }
}

/// Content hash of an executable, as computed by the uploading agent
///
/// The hash names the stored executable, so it is restricted to a path-safe
/// alphabet: ASCII alphanumerics, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExecutableHash(String);

impl ExecutableHash {
    /// Validate a raw hash string
    pub fn parse(raw: impl Into<String>) -> Result<Self, IngestionError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IngestionError::invalid_id("executable hash is empty"));
        }
        if raw.len() > MAX_HASH_LEN {
            return Err(IngestionError::invalid_id(format!(
                "executable hash is {} characters long, maximum is {}",
                raw.len(),
                MAX_HASH_LEN
            )));
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(IngestionError::invalid_id(format!(
                "executable hash contains forbidden character {:?}",
                c
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutableHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ExecutableHash {
    type Error = IngestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ExecutableHash> for String {
    fn from(hash: ExecutableHash) -> Self {
        hash.0
    }
}

impl FromStr for ExecutableHash {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
