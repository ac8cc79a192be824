//! # Coredrop Domain Layer
//!
//! This crate contains the business logic of the coredrop crash-dump collector:
//! the upload framing protocol, the ingestion pipeline and the domain models
//! it produces. It follows hexagonal architecture principles:
//!
//! - **Entities**: Core domain models (UploadHeader, Coredump)
//! - **Ports**: Trait definitions for external dependencies (ArtifactStore, CoredumpIndex)
//! - **Services**: Pipeline orchestration (IngestionService)
//!
//! ## Architecture
//!
//! This layer has NO dependencies on HTTP or on a concrete storage backend.
//! The artifact store and the downstream index are expressed as traits (ports)
//! implemented by adapter crates.
//!
//! ## Example
//!
//! ```rust,no_run
//! use coredrop_domain::ingestion::IngestionService;
//! use coredrop_domain::ports::{ArtifactStore, CoredumpIndex};
//!
//! async fn example<S, I>(service: IngestionService<S, I>, body: std::fs::File)
//! where
//!     S: ArtifactStore + 'static,
//!     I: CoredumpIndex,
//! {
//!     match service.ingest(body).await {
//!         Ok(coredump) => println!("Ingested core {}", coredump.uid),
//!         Err(failure) => eprintln!("Upload {} failed: {}", failure.uid, failure.error),
//!     }
//! }
//! ```

pub mod ingestion;
pub mod ports;

// Re-export commonly used types
pub use ingestion::{
    Coredump, CoredumpId, ExecutableHash, IngestionError, IngestionFailure, IngestionService,
    UploadHeader,
};
pub use ports::{ArtifactStore, CoredumpIndex};
