//! In-memory adapters and fixtures shared by the ingestion tests

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::ingestion::entity::{Coredump, UploadHeader};
use crate::ingestion::error::IngestionError;
use crate::ingestion::framing::SegmentedWriter;
use crate::ingestion::ids::{CoredumpId, ExecutableHash};
use crate::ports::{ArtifactStore, CoredumpIndex};

/// Header of the reference upload: h1 crashed /bin/app with signal 11
pub fn sample_header() -> UploadHeader {
    UploadHeader {
        date: None,
        hostname: "h1".to_string(),
        executable_path: "/bin/app".to_string(),
        executable_hash: ExecutableHash::parse("abc123").unwrap(),
        metadata: BTreeMap::from([("signal".to_string(), "11".to_string())]),
    }
}

pub fn encode_upload(header: &UploadHeader, core: &[u8], executable: &[u8]) -> Vec<u8> {
    let mut writer = SegmentedWriter::new(Vec::new());
    writer.write_header(header).unwrap();
    writer.write_segment(core).unwrap();
    writer.write_segment(executable).unwrap();
    writer.finish().unwrap()
}

/// Artifact store keeping files in a map
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_writes.store(true, Ordering::SeqCst);
        store
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryStore {
    fn core_path(&self, uid: &CoredumpId) -> PathBuf {
        PathBuf::from("cores").join(format!("{}.core", uid))
    }

    fn executable_path(&self, hash: &ExecutableHash) -> PathBuf {
        PathBuf::from("executables").join(format!("{}.exe", hash))
    }

    fn write<R: Read + ?Sized>(&self, path: &Path, source: &mut R) -> Result<u64, IngestionError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(IngestionError::storage_write("disk full"));
        }

        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .map_err(|err| IngestionError::framing(err.to_string()))?;

        let written = data.len() as u64;
        self.files.lock().unwrap().insert(path.to_path_buf(), data);
        Ok(written)
    }
}

/// Index recording every submitted record
#[derive(Default, Clone)]
pub struct MemoryIndex {
    records: Arc<Mutex<Vec<Coredump>>>,
    fail: bool,
}

impl MemoryIndex {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<Coredump> {
        self.records.lock().unwrap().clone()
    }
}

impl CoredumpIndex for MemoryIndex {
    fn index(
        &self,
        coredump: &Coredump,
    ) -> impl std::future::Future<Output = Result<(), IngestionError>> + Send {
        let records = self.records.clone();
        let fail = self.fail;
        let coredump = coredump.clone();

        async move {
            if fail {
                return Err(IngestionError::index("index unavailable"));
            }
            records.lock().unwrap().push(coredump);
            Ok(())
        }
    }
}

/// Observations made on a [`TrackedBody`]
#[derive(Clone, Default)]
pub struct BodyProbe {
    drops: Arc<AtomicUsize>,
    read: Arc<AtomicUsize>,
}

impl BodyProbe {
    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    pub fn bytes_read(&self) -> usize {
        self.read.load(Ordering::SeqCst)
    }
}

/// Request body that reports how much was read and when it is released
pub struct TrackedBody {
    inner: Cursor<Vec<u8>>,
    probe: BodyProbe,
}

impl TrackedBody {
    pub fn new(data: Vec<u8>) -> (Self, BodyProbe) {
        let probe = BodyProbe::default();
        let body = Self {
            inner: Cursor::new(data),
            probe: probe.clone(),
        };
        (body, probe)
    }
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.probe.read.fetch_add(n, Ordering::SeqCst);
        Ok(n)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.probe.drops.fetch_add(1, Ordering::SeqCst);
    }
}
