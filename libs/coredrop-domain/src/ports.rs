//! Ports (trait definitions) for external dependencies
//!
//! This module defines the contracts (ports) that external adapters must implement.
//! Following hexagonal architecture, the domain defines what it needs, and the
//! infrastructure provides implementations.
//!
//! ## Static Dispatch
//!
//! We use native Rust async traits with `impl Future` return types instead of
//! `async_trait` to ensure zero-cost abstractions and static dispatch.
//! The artifact store is synchronous: it is driven from the blocking part of
//! the pipeline, where the upload body is a plain `std::io::Read`.

use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::ingestion::{
    entity::Coredump,
    error::IngestionError,
    ids::{CoredumpId, ExecutableHash},
};

/// Port for the content-addressed artifact store
///
/// Core images are addressed by the request UID, so every upload gets its own
/// file. Executables are addressed by their content hash, so uploads of the
/// same binary converge on one file without an existence check.
pub trait ArtifactStore: Send + Sync {
    /// Deterministic location of the core image for `uid`
    fn core_path(&self, uid: &CoredumpId) -> PathBuf;

    /// Deterministic location of the executable with content hash `hash`
    fn executable_path(&self, hash: &ExecutableHash) -> PathBuf;

    /// Copy `source` to `path` until it is exhausted
    ///
    /// Creates missing parent directories and replaces any existing file.
    ///
    /// # Returns
    ///
    /// The number of bytes written
    ///
    /// # Errors
    ///
    /// - `IngestionError::Framing` if reading `source` fails
    /// - `IngestionError::StorageWrite` on any filesystem failure; whatever was
    ///   written so far must not be trusted
    fn write<R: Read + ?Sized>(&self, path: &Path, source: &mut R) -> Result<u64, IngestionError>;
}

/// Port for the downstream index receiving ingested records
///
/// The index is assumed safe to retry by a caller above the pipeline; the
/// pipeline itself submits once and reports the failure.
pub trait CoredumpIndex: Send + Sync {
    /// Submit one record
    ///
    /// # Errors
    ///
    /// Returns `IngestionError::Index` if the record could not be indexed
    fn index(&self, coredump: &Coredump) -> impl Future<Output = Result<(), IngestionError>> + Send;
}
