//! Ingestion service - Pipeline orchestration
//!
//! This module drives one upload from raw body to an indexed [`Coredump`].
//! The service coordinates the request context, the artifact store port and
//! the index port.

use std::io::Read;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use super::{Coredump, IngestionError, IngestionFailure, UploadRequest};
use crate::ports::{ArtifactStore, CoredumpIndex};

/// Configuration for the ingestion service
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Capacity of the buffer between the body and the decoders (default: 64KB)
    pub read_buffer_size: usize,
    /// Largest accepted decompressed header (default: 1MB)
    pub max_header_size: usize,
    /// Unread body bytes discarded when an upload ends (default: 64MB)
    pub drain_limit: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 64 * 1024,    // 64KB
            max_header_size: 1024 * 1024,   // 1MB
            drain_limit: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Service for ingesting crash-dump uploads
///
/// For every upload the service:
/// - Assigns a fresh request UID
/// - Decodes the header and streams core and executable into the store
/// - Submits a `Coredump` record to the index, only if all of the above succeeded
/// - Releases the body whatever happened
///
/// ## Static Dispatch
///
/// The service is generic over its `ArtifactStore` and `CoredumpIndex`
/// implementations. The compiler will generate specialized versions for each
/// concrete pair, resulting in zero-cost abstractions.
pub struct IngestionService<S, I> {
    store: Arc<S>,
    index: I,
    config: IngestionConfig,
}

impl<S, I> IngestionService<S, I>
where
    S: ArtifactStore + 'static,
    I: CoredumpIndex,
{
    /// Create a new IngestionService with the given adapters and configuration
    pub fn new(store: S, index: I, config: IngestionConfig) -> Self {
        Self {
            store: Arc::new(store),
            index,
            config,
        }
    }

    /// Create a new IngestionService with default configuration
    pub fn with_adapters(store: S, index: I) -> Self {
        Self::new(store, index, IngestionConfig::default())
    }

    /// Open the request context for one upload body
    pub fn begin<B: Read>(&self, body: B) -> UploadRequest<S, B> {
        UploadRequest::begin(body, Arc::clone(&self.store), &self.config)
    }

    /// Ingest one upload body and return the indexed record
    ///
    /// Header, core and executable are read on the blocking pool since the
    /// body is a synchronous reader. The record is submitted only once both
    /// artifacts are written; the body is released before this returns,
    /// on every path.
    ///
    /// # Errors
    ///
    /// An `IngestionFailure` carrying the request UID and the first error:
    /// - `IngestionError::Framing` if the body is malformed, truncated or aborted
    /// - `IngestionError::HeaderDecode` if the header segment is invalid
    /// - `IngestionError::StorageWrite` if an artifact could not be written
    /// - `IngestionError::Index` if the index rejected the record
    pub async fn ingest<B>(&self, body: B) -> Result<Coredump, IngestionFailure>
    where
        B: Read + Send + 'static,
    {
        let mut request = self.begin(body);
        let uid = request.uid();
        let span = request.span().clone();

        let received = tokio::task::spawn_blocking(move || {
            let received = request.receive();
            request.finish();
            received
        })
        .await
        .map_err(|err| {
            let error = IngestionError::internal(format!("upload worker failed: {}", err));
            error!(parent: &span, error = %error, "upload aborted");
            IngestionFailure::new(uid, error)
        })?;

        let header = received.map_err(|error| {
            if error.is_client_error() {
                warn!(parent: &span, error = %error, "upload rejected");
            } else {
                error!(parent: &span, error = %error, "upload failed");
            }
            IngestionFailure::new(uid, error)
        })?;

        let coredump = Coredump::new(uid, header);
        self.submit(&coredump)
            .instrument(span.clone())
            .await
            .map_err(|error| IngestionFailure::new(uid, error))?;

        info!(
            parent: &span,
            hostname = %coredump.hostname,
            executable_hash = %coredump.executable_hash,
            "coredump indexed"
        );
        Ok(coredump)
    }

    /// Hand a record whose artifacts are stored to the index
    async fn submit(&self, coredump: &Coredump) -> Result<(), IngestionError> {
        self.index.index(coredump).await.map_err(|err| {
            error!(error = %err, "indexing coredump failed");
            match err {
                IngestionError::Index(_) => err,
                other => IngestionError::index(other.to_string()),
            }
        })
    }

    /// Get the artifact store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the index
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Get the service configuration
    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }
}
