//! Ingestion domain module
//!
//! This module contains the upload framing, the per-request pipeline and the
//! entities it produces. An upload flows header -> core -> executable -> index.

pub mod entity;
pub mod error;
pub mod framing;
pub mod ids;
pub mod request;
pub mod service;

#[cfg(test)]
mod testing;

pub use entity::{Coredump, UploadHeader};
pub use error::{IngestionError, IngestionFailure, Result};
pub use framing::{SegmentedReader, SegmentedWriter};
pub use ids::{CoredumpId, ExecutableHash};
pub use request::UploadRequest;
pub use service::{IngestionConfig, IngestionService};
