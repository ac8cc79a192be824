//! JSON file index implementation
//!
//! A minimal `CoredumpIndex` keeping one pretty-printed JSON document per
//! record. It gives the analysis stage something to scan and lets operators
//! inspect what was ingested with standard tools.

use std::io;
use std::path::{Path, PathBuf};

use coredrop_domain::{
    ingestion::{entity::Coredump, error::IngestionError, ids::CoredumpId},
    ports::CoredumpIndex,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Directory of `<uid>.json` records
#[derive(Debug, Clone)]
pub struct JsonFileIndex {
    root: PathBuf,
}

impl JsonFileIndex {
    /// Open the index at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, IngestionError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|err| {
            IngestionError::index(format!(
                "creating index directory '{}': {}",
                root.display(),
                err
            ))
        })?;
        info!(root = %root.display(), "Initializing JsonFileIndex");
        Ok(Self { root })
    }

    /// Get the index directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(root: &Path, uid: &CoredumpId) -> PathBuf {
        root.join(format!("{}.json", uid))
    }

    /// Read back the record of one upload, if it was indexed
    #[instrument(skip(self, uid), fields(uid = %uid))]
    pub async fn get(&self, uid: &CoredumpId) -> Result<Option<Coredump>, IngestionError> {
        let path = Self::record_path(&self.root, uid);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(IngestionError::index(format!(
                    "reading '{}': {}",
                    path.display(),
                    err
                )))
            }
        };

        serde_json::from_slice(&raw).map(Some).map_err(|err| {
            IngestionError::index(format!("decoding '{}': {}", path.display(), err))
        })
    }

    /// All indexed records, ordered by uid (and so by ingestion time)
    pub async fn list(&self) -> Result<Vec<Coredump>, IngestionError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|err| IngestionError::index(format!("listing index: {}", err)))?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| IngestionError::index(format!("listing index: {}", err)))?
        {
            let name = entry.file_name();
            let Some(uid) = name
                .to_str()
                .and_then(|name| name.strip_suffix(".json"))
                .and_then(|stem| stem.parse::<CoredumpId>().ok())
            else {
                continue;
            };
            if let Some(record) = self.get(&uid).await? {
                records.push(record);
            }
        }

        records.sort_by_key(|record| record.uid);
        Ok(records)
    }
}

impl CoredumpIndex for JsonFileIndex {
    #[instrument(skip(self, coredump), fields(uid = %coredump.uid))]
    fn index(
        &self,
        coredump: &Coredump,
    ) -> impl std::future::Future<Output = Result<(), IngestionError>> + Send {
        let path = Self::record_path(&self.root, &coredump.uid);
        let partial = self.root.join(format!(".{}.{}.partial", coredump.uid, Uuid::now_v7()));
        let encoded = serde_json::to_vec_pretty(coredump);

        async move {
            let encoded = encoded
                .map_err(|err| IngestionError::index(format!("encoding record: {}", err)))?;
            debug!(path = %path.display(), "Writing index record");

            if let Err(err) = tokio::fs::write(&partial, &encoded).await {
                error!(path = %partial.display(), error = ?err, "Failed to write index record");
                discard_partial(&partial).await;
                return Err(IngestionError::index(format!(
                    "writing '{}': {}",
                    partial.display(),
                    err
                )));
            }

            match tokio::fs::rename(&partial, &path).await {
                Ok(()) => {
                    info!(path = %path.display(), "Indexed coredump");
                    Ok(())
                }
                Err(err) => {
                    error!(path = %path.display(), error = ?err, "Failed to publish index record");
                    discard_partial(&partial).await;
                    Err(IngestionError::index(format!(
                        "renaming '{}' to '{}': {}",
                        partial.display(),
                        path.display(),
                        err
                    )))
                }
            }
        }
    }
}

async fn discard_partial(partial: &Path) {
    if let Err(cleanup) = tokio::fs::remove_file(partial).await {
        if cleanup.kind() != io::ErrorKind::NotFound {
            debug!(error = %cleanup, partial = %partial.display(), "Partial record left behind");
        }
    }
}
