//! Upload body framing
//!
//! An upload body is three gzip members written back to back: the JSON
//! header, the core image and the executable image. There is no multipart
//! boundary and no length prefix; a segment ends where its gzip member ends.
//!
//! [`SegmentedReader`] decodes such a body one member at a time without
//! buffering a whole payload, and [`SegmentedWriter`] produces it.

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};

use crate::ingestion::entity::UploadHeader;
use crate::ingestion::error::{IngestionError, Result};

/// Reads consecutive single-member gzip segments from one byte source
///
/// Every segment is decoded by its own session over the same buffered source.
/// The session stops at the end of its gzip member, so bytes of the following
/// segment stay in the buffer for the next call to [`next_segment`].
///
/// [`next_segment`]: SegmentedReader::next_segment
pub struct SegmentedReader<R> {
    source: BufReader<R>,
    opened: usize,
}

impl<R: Read> SegmentedReader<R> {
    pub fn new(body: R) -> Self {
        Self {
            source: BufReader::new(body),
            opened: 0,
        }
    }

    pub fn with_capacity(capacity: usize, body: R) -> Self {
        Self {
            source: BufReader::with_capacity(capacity, body),
            opened: 0,
        }
    }

    /// Open a decompression session on the segment at the current offset
    ///
    /// The returned [`Segment`] borrows the reader: it has to be read to
    /// exhaustion (or dropped) before the next segment can be opened.
    ///
    /// # Errors
    ///
    /// `IngestionError::Framing` if the source is exhausted, fails, or does not
    /// start with a gzip member header at this offset.
    pub fn next_segment(&mut self) -> Result<Segment<'_, R>> {
        let index = self.opened + 1;

        let exhausted = self.source.fill_buf().map(|buf| buf.is_empty());
        match exhausted {
            Ok(true) => {
                return Err(IngestionError::framing(format!(
                    "segment {} is missing: upload ended early",
                    index
                )))
            }
            Ok(false) => {}
            Err(err) => {
                return Err(IngestionError::framing(format!(
                    "reading segment {}: {}",
                    index, err
                )))
            }
        }

        let decoder = GzDecoder::new(&mut self.source);
        if decoder.header().is_none() {
            return Err(IngestionError::framing(format!(
                "segment {} does not start with a gzip header",
                index
            )));
        }

        self.opened = index;
        Ok(Segment { index, decoder })
    }

    /// Number of segments opened so far
    pub fn segments_opened(&self) -> usize {
        self.opened
    }

    /// Discard up to `limit` remaining raw bytes of the source
    pub fn drain(&mut self, limit: u64) -> io::Result<u64> {
        io::copy(&mut self.source.by_ref().take(limit), &mut io::sink())
    }

    /// Give back the underlying source; buffered bytes are dropped
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }
}

/// One decompression session, positioned inside a single gzip member
///
/// Reads return decompressed bytes of this segment only and hit EOF at the
/// member's trailer. Truncation or a CRC mismatch surface as read errors.
pub struct Segment<'a, R> {
    index: usize,
    decoder: GzDecoder<&'a mut BufReader<R>>,
}

impl<'a, R: Read> Segment<'a, R> {
    /// Position of this segment in the body, starting at 1
    pub fn index(&self) -> usize {
        self.index
    }

    /// Release the session, handing the source back to the reader
    pub fn close(self) {}
}

impl<R> fmt::Debug for Segment<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment").field("index", &self.index).finish()
    }
}

impl<'a, R: Read> Read for Segment<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoder.read(buf)
    }
}

/// Writes an upload body as consecutive gzip segments
///
/// This is the agent side of the framing: call [`write_header`] and then
/// [`write_segment`] (or [`write_segment_from`]) for the core and the
/// executable.
///
/// [`write_header`]: SegmentedWriter::write_header
/// [`write_segment`]: SegmentedWriter::write_segment
/// [`write_segment_from`]: SegmentedWriter::write_segment_from
pub struct SegmentedWriter<W: Write> {
    sink: W,
    level: Compression,
}

impl<W: Write> SegmentedWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_level(sink, Compression::default())
    }

    pub fn with_level(sink: W, level: Compression) -> Self {
        Self { sink, level }
    }

    /// Append the JSON header as one segment
    pub fn write_header(&mut self, header: &UploadHeader) -> io::Result<()> {
        let mut encoder = GzEncoder::new(&mut self.sink, self.level);
        serde_json::to_writer(&mut encoder, header)?;
        encoder.finish()?;
        Ok(())
    }

    /// Append `data` as one segment
    pub fn write_segment(&mut self, data: &[u8]) -> io::Result<()> {
        let mut encoder = GzEncoder::new(&mut self.sink, self.level);
        encoder.write_all(data)?;
        encoder.finish()?;
        Ok(())
    }

    /// Append everything `source` yields as one segment, streaming
    pub fn write_segment_from<S: Read + ?Sized>(&mut self, source: &mut S) -> io::Result<u64> {
        let mut encoder = GzEncoder::new(&mut self.sink, self.level);
        let copied = io::copy(source, &mut encoder)?;
        encoder.finish()?;
        Ok(copied)
    }

    /// Flush and return the sink
    pub fn finish(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
