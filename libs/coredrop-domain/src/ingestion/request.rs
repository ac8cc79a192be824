//! Per-request pipeline state
//!
//! An [`UploadRequest`] owns everything one upload needs: its identity, the
//! segmented body and a handle to the artifact store. The steps must run in
//! order (header, core, executable) because each needs what the previous one
//! produced; [`UploadRequest::receive`] chains them and stops at the first
//! error.

use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info, info_span, Span};

use crate::ingestion::entity::UploadHeader;
use crate::ingestion::error::{IngestionError, Result};
use crate::ingestion::framing::SegmentedReader;
use crate::ingestion::ids::CoredumpId;
use crate::ingestion::service::IngestionConfig;
use crate::ports::ArtifactStore;

/// Request context of one upload
pub struct UploadRequest<S, B> {
    uid: CoredumpId,
    span: Span,
    store: Arc<S>,
    reader: SegmentedReader<B>,
    max_header_size: usize,
    drain_limit: u64,
}

impl<S, B> UploadRequest<S, B>
where
    S: ArtifactStore,
    B: Read,
{
    /// Start handling an upload body under a fresh request UID
    pub fn begin(body: B, store: Arc<S>, config: &IngestionConfig) -> Self {
        let uid = CoredumpId::new();
        let span = info_span!("upload", uid = %uid);
        span.in_scope(|| debug!("upload started"));

        Self {
            uid,
            span,
            store,
            reader: SegmentedReader::with_capacity(config.read_buffer_size, body),
            max_header_size: config.max_header_size,
            drain_limit: config.drain_limit,
        }
    }

    pub fn uid(&self) -> CoredumpId {
        self.uid
    }

    /// Span tagged with the request UID, for work done on behalf of this upload
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Run the header, core and executable steps, stopping at the first error
    pub fn receive(&mut self) -> Result<UploadHeader> {
        let span = self.span.clone();
        let _entered = span.enter();

        let header = self.read_header()?;
        self.read_core()?;
        self.read_executable(&header)?;
        Ok(header)
    }

    /// Decode segment 1 as the upload header
    ///
    /// # Errors
    ///
    /// - `IngestionError::Framing` if the segment is missing or corrupted
    /// - `IngestionError::HeaderDecode` if it is not a valid header or is
    ///   larger than the configured maximum
    pub fn read_header(&mut self) -> Result<UploadHeader> {
        let limit = self.max_header_size;
        let segment = self.reader.next_segment()?;

        let mut raw = Vec::new();
        segment
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(|err| IngestionError::framing(format!("reading header segment: {}", err)))?;
        if raw.len() > limit {
            return Err(IngestionError::header_decode(format!(
                "header exceeds {} bytes",
                limit
            )));
        }

        let header: UploadHeader = serde_json::from_slice(&raw)
            .map_err(|err| IngestionError::header_decode(format!("parsing header: {}", err)))?;

        debug!(
            hostname = %header.hostname,
            executable_hash = %header.executable_hash,
            "header decoded"
        );
        Ok(header)
    }

    /// Stream segment 2 into the store under the request UID
    ///
    /// The segment is opened before the core file is created, so a body that
    /// ends after the header leaves nothing behind.
    pub fn read_core(&mut self) -> Result<u64> {
        let mut segment = self.reader.next_segment()?;
        let path = self.store.core_path(&self.uid);

        let written = self.store.write(&path, &mut segment)?;
        info!(bytes = written, path = %path.display(), "core stored");
        Ok(written)
    }

    /// Stream segment 3 into the store under the header's executable hash
    pub fn read_executable(&mut self, header: &UploadHeader) -> Result<u64> {
        let mut segment = self.reader.next_segment()?;
        let path = self.store.executable_path(&header.executable_hash);

        let written = self.store.write(&path, &mut segment)?;
        info!(bytes = written, path = %path.display(), "executable stored");
        Ok(written)
    }

    /// Release the body: drain what the client still sends, then drop it
    ///
    /// Consumes the request, so it runs once whichever step failed.
    /// Returns the number of bytes drained.
    pub fn finish(mut self) -> u64 {
        let _entered = self.span.clone().entered();

        let drained = match self.reader.drain(self.drain_limit) {
            Ok(drained) => drained,
            Err(err) => {
                debug!(error = %err, "body drain stopped");
                0
            }
        };
        if drained > 0 {
            debug!(bytes = drained, "drained unread body bytes");
        }

        drop(self.reader.into_inner());
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::framing::SegmentedWriter;
    use crate::ingestion::ids::ExecutableHash;
    use crate::ingestion::testing::{encode_upload, sample_header, MemoryStore, TrackedBody};
    use std::io::Cursor;

    fn request<B: Read>(body: B, store: &Arc<MemoryStore>) -> UploadRequest<MemoryStore, B> {
        UploadRequest::begin(body, Arc::clone(store), &IngestionConfig::default())
    }

    #[test]
    fn test_steps_store_both_artifacts() {
        let store = Arc::new(MemoryStore::default());
        let body = encode_upload(&sample_header(), b"CORE", b"EXE");
        let mut req = request(Cursor::new(body), &store);

        let header = req.read_header().unwrap();
        assert_eq!(req.read_core().unwrap(), 4);
        assert_eq!(req.read_executable(&header).unwrap(), 3);

        let uid = req.uid();
        assert_eq!(req.finish(), 0);
        assert_eq!(
            store.get(&store.core_path(&uid)).as_deref(),
            Some(&b"CORE"[..])
        );
        assert_eq!(
            store
                .get(&store.executable_path(&header.executable_hash))
                .as_deref(),
            Some(&b"EXE"[..])
        );
    }

    #[test]
    fn test_header_only_body_creates_no_core() {
        let store = Arc::new(MemoryStore::default());
        let mut writer = SegmentedWriter::new(Vec::new());
        writer.write_header(&sample_header()).unwrap();
        let body = writer.finish().unwrap();
        let mut req = request(Cursor::new(body), &store);

        req.read_header().unwrap();
        let err = req.read_core().unwrap_err();

        assert!(matches!(err, IngestionError::Framing(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_header_is_a_decode_error() {
        let store = Arc::new(MemoryStore::default());
        let mut writer = SegmentedWriter::new(Vec::new());
        writer.write_segment(b"{\"hostname\": ").unwrap();
        let mut req = request(Cursor::new(writer.finish().unwrap()), &store);

        let err = req.read_header().unwrap_err();

        assert!(matches!(err, IngestionError::HeaderDecode(_)));
    }

    #[test]
    fn test_oversized_header_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let mut header = sample_header();
        header
            .metadata
            .insert("padding".to_string(), "x".repeat(4096));
        let body = encode_upload(&header, b"", b"");
        let config = IngestionConfig {
            max_header_size: 1024,
            ..IngestionConfig::default()
        };
        let mut req = UploadRequest::begin(Cursor::new(body), Arc::clone(&store), &config);

        let err = req.read_header().unwrap_err();

        assert!(matches!(err, IngestionError::HeaderDecode(ref msg) if msg.contains("1024")));
    }

    #[test]
    fn test_unbounded_header_limit_reads_header() {
        let store = Arc::new(MemoryStore::default());
        let body = encode_upload(&sample_header(), b"CORE", b"EXE");
        let config = IngestionConfig {
            max_header_size: usize::MAX,
            ..IngestionConfig::default()
        };
        let mut req = UploadRequest::begin(Cursor::new(body), Arc::clone(&store), &config);

        let header = req.read_header().unwrap();

        assert_eq!(header, sample_header());
    }

    #[test]
    fn test_receive_stops_at_first_error() {
        let store = Arc::new(MemoryStore::default());
        let mut body = encode_upload(&sample_header(), b"CORE", b"EXE");
        // Cut into the executable segment
        body.truncate(body.len() - 4);
        let mut req = request(Cursor::new(body), &store);

        let err = req.receive().unwrap_err();

        assert!(matches!(err, IngestionError::Framing(_)));
        let hash = ExecutableHash::parse("abc123").unwrap();
        assert!(store.get(&store.core_path(&req.uid())).is_some());
        assert!(store.get(&store.executable_path(&hash)).is_none());
    }

    #[test]
    fn test_finish_drains_and_drops_body() {
        let store = Arc::new(MemoryStore::default());
        let mut body = encode_upload(&sample_header(), b"CORE", b"EXE");
        let total = body.len() + 300;
        body.extend_from_slice(&[0u8; 300]);
        let (body, probe) = TrackedBody::new(body);
        let mut req = request(body, &store);

        req.receive().unwrap();
        assert_eq!(req.finish(), 300);

        assert_eq!(probe.drops(), 1);
        assert_eq!(probe.bytes_read(), total);
    }

    #[test]
    fn test_finish_respects_drain_limit() {
        let store = Arc::new(MemoryStore::default());
        let (body, probe) = TrackedBody::new(vec![9u8; 10_000]);
        let config = IngestionConfig {
            read_buffer_size: 16,
            drain_limit: 100,
            ..IngestionConfig::default()
        };
        let mut req = UploadRequest::begin(body, Arc::clone(&store), &config);

        assert!(req.read_header().is_err());
        assert_eq!(req.finish(), 100);
        assert_eq!(probe.drops(), 1);
        assert!(probe.bytes_read() < 10_000);
    }
}
