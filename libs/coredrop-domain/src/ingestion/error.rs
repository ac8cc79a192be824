//! Domain errors for ingestion operations
//!
//! This module defines all possible errors that can occur while ingesting an
//! upload. These are domain-level errors that abstract away infrastructure
//! details: adapters convert their I/O failures into one of these kinds.

use thiserror::Error;

use crate::ingestion::ids::CoredumpId;

/// Errors that can occur during upload ingestion
#[derive(Error, Debug)]
pub enum IngestionError {
    /// A segment boundary could not be found or a segment failed to decompress
    /// (malformed, truncated or aborted upload)
    #[error("Framing error: {0}")]
    Framing(String),

    /// The first segment is not a valid upload header
    #[error("Header decode error: {0}")]
    HeaderDecode(String),

    /// Persisting an artifact to the store failed
    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    /// The downstream index rejected or could not accept the record
    #[error("Index error: {0}")]
    Index(String),

    /// An identifier supplied by a caller is malformed
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// An unexpected internal error occurred
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestionError {
    /// Create a framing error with a message
    pub fn framing(msg: impl Into<String>) -> Self {
        Self::Framing(msg.into())
    }

    /// Create a header decode error with a message
    pub fn header_decode(msg: impl Into<String>) -> Self {
        Self::HeaderDecode(msg.into())
    }

    /// Create a storage write error with a message
    pub fn storage_write(msg: impl Into<String>) -> Self {
        Self::StorageWrite(msg.into())
    }

    /// Create an index error with a message
    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// Create an invalid identifier error with a message
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the failure was caused by what the client sent
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Framing(_) | Self::HeaderDecode(_) | Self::InvalidId(_)
        )
    }
}

/// The single error surfaced for a failed upload, tagged with its request UID
#[derive(Error, Debug)]
#[error("upload {uid}: {error}")]
pub struct IngestionFailure {
    /// Identity assigned to the request when it began
    pub uid: CoredumpId,

    /// First error encountered by the pipeline
    #[source]
    pub error: IngestionError,
}

impl IngestionFailure {
    pub fn new(uid: CoredumpId, error: IngestionError) -> Self {
        Self { uid, error }
    }
}

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestionError>;
