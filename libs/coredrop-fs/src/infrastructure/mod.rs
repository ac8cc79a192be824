//! Filesystem implementations of the domain ports

mod fs_store;
mod json_index;

pub use fs_store::FsArtifactStore;
pub use json_index::JsonFileIndex;
