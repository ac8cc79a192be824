//! # Coredrop Filesystem Adapters
//!
//! Implementations of the domain ports backed by a local directory tree:
//!
//! - [`FsArtifactStore`](infrastructure::FsArtifactStore): content-addressed
//!   storage for core images and executables
//! - [`JsonFileIndex`](infrastructure::JsonFileIndex): one JSON document per
//!   ingested coredump

pub mod infrastructure;

pub use infrastructure::{FsArtifactStore, JsonFileIndex};
