//! Filesystem Artifact Store Implementation
//!
//! This module implements the `ArtifactStore` port on a local directory. It
//! handles all file operations and converts I/O errors to domain errors.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use coredrop_domain::{
    ingestion::{error::IngestionError, ids::CoredumpId, ids::ExecutableHash},
    ports::ArtifactStore,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const CORES_DIR: &str = "cores";
const EXECUTABLES_DIR: &str = "executables";
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Directory-backed implementation of the ArtifactStore port
///
/// Layout under the root directory:
///
/// ```text
/// <root>/cores/<uid>.core          one per upload
/// <root>/executables/<hash>.exe    shared by every upload of that binary
/// ```
///
/// ## Writes
///
/// Bytes are streamed into a uniquely named `.partial` sibling of the
/// destination, synced, then renamed over it. Two uploads of the same
/// executable therefore never interleave their bytes: the last rename wins,
/// and equal hashes mean equal content. A failed write removes its partial
/// file and leaves the destination untouched.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `root` without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store rooted at `root`, creating its namespaces
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use coredrop_fs::FsArtifactStore;
    ///
    /// let store = FsArtifactStore::open("/var/lib/coredrop").unwrap();
    /// assert!(store.root().join("cores").is_dir());
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, IngestionError> {
        let store = Self::new(root);
        for dir in [store.root.join(CORES_DIR), store.root.join(EXECUTABLES_DIR)] {
            fs::create_dir_all(&dir).map_err(|err| {
                IngestionError::storage_write(format!(
                    "creating directory '{}': {}",
                    dir.display(),
                    err
                ))
            })?;
        }
        info!(root = %store.root.display(), "Initializing FsArtifactStore");
        Ok(store)
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the in-flight file for a write to `path`
    fn partial_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}.partial", name, Uuid::now_v7()))
    }

    /// Stream `source` into a new file at `partial`, then sync it
    fn copy_into<R: Read + ?Sized>(partial: &Path, source: &mut R) -> Result<u64, IngestionError> {
        let mut file = File::create(partial).map_err(|err| {
            IngestionError::storage_write(format!(
                "creating '{}': {}",
                partial.display(),
                err
            ))
        })?;

        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut written = 0u64;
        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(IngestionError::framing(format!(
                        "reading upload segment: {}",
                        err
                    )))
                }
            };
            file.write_all(&buf[..n]).map_err(|err| {
                IngestionError::storage_write(format!(
                    "writing '{}': {}",
                    partial.display(),
                    err
                ))
            })?;
            written += n as u64;
        }

        file.sync_all().map_err(|err| {
            IngestionError::storage_write(format!("syncing '{}': {}", partial.display(), err))
        })?;
        Ok(written)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn core_path(&self, uid: &CoredumpId) -> PathBuf {
        self.root.join(CORES_DIR).join(format!("{}.core", uid))
    }

    fn executable_path(&self, hash: &ExecutableHash) -> PathBuf {
        self.root.join(EXECUTABLES_DIR).join(format!("{}.exe", hash))
    }

    #[instrument(skip(self, path, source), fields(path = %path.display()))]
    fn write<R: Read + ?Sized>(&self, path: &Path, source: &mut R) -> Result<u64, IngestionError> {
        debug!("Writing artifact");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                IngestionError::storage_write(format!(
                    "creating directory '{}': {}",
                    parent.display(),
                    err
                ))
            })?;
        }

        let partial = Self::partial_path(path);
        let result = Self::copy_into(&partial, source).and_then(|written| {
            fs::rename(&partial, path)
                .map(|_| written)
                .map_err(|err| {
                    IngestionError::storage_write(format!(
                        "renaming '{}' to '{}': {}",
                        partial.display(),
                        path.display(),
                        err
                    ))
                })
        });

        match result {
            Ok(written) => {
                debug!(bytes = written, "Artifact written");
                Ok(written)
            }
            Err(err) => {
                error!(error = %err, "Failed to write artifact");
                if let Err(cleanup) = fs::remove_file(&partial) {
                    if cleanup.kind() != io::ErrorKind::NotFound {
                        debug!(error = %cleanup, partial = %partial.display(), "Partial file left behind");
                    }
                }
                Err(err)
            }
        }
    }
}
