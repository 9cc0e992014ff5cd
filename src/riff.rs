//! Minimal RIFF chunk walker.
//!
//! A RIFF file is a sequence of tagged, length-prefixed chunks:
//!
//! ```text
//! [tag (4 bytes)][size_u32_le (4 bytes)][body (size bytes)]
//! ```
//!
//! The outer `RIFF` chunk carries a 4-byte form type (`WAVE`) followed by the
//! sub-chunks. [`ChunkReader`] tracks its own cursor against the stream length
//! so every header read and skip is bounds-checked before touching the source.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use log::{debug, warn};

use crate::error::{ExtractError, ExtractResult};

pub const RIFF_TAG: [u8; 4] = *b"RIFF";
pub const WAVE_FORM: [u8; 4] = *b"WAVE";
pub const FMT_TAG: [u8; 4] = *b"fmt ";
pub const DATA_TAG: [u8; 4] = *b"data";

/// Size of a chunk header on the wire.
pub const CHUNK_HEADER_LEN: u64 = 8;

/// Tag and declared body size of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: [u8; 4],
    pub size: u32,
}

impl ChunkHeader {
    pub fn is(&self, tag: &[u8; 4]) -> bool {
        &self.tag == tag
    }
}

impl fmt::Display for ChunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", tag_name(&self.tag), self.size)
    }
}

/// Printable form of a 4-byte tag; non-ASCII bytes are escaped.
pub fn tag_name(tag: &[u8; 4]) -> String {
    tag.escape_ascii().to_string()
}

/// The outer `RIFF` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    pub header: ChunkHeader,
    pub form: [u8; 4],
}

/// Bounds-checked cursor over a seekable RIFF stream.
pub struct ChunkReader<R> {
    inner: R,
    pos: u64,
    len: u64,
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Wrap `inner`, treating its current position as the start of the RIFF file.
    pub fn new(mut inner: R) -> ExtractResult<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self { inner, pos, len })
    }

    /// Absolute cursor position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bytes left between the cursor and the end of the stream.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    fn ensure(&self, needed: u64, context: &'static str) -> ExtractResult<()> {
        let available = self.remaining();
        if needed > available {
            return Err(ExtractError::TruncatedFile {
                context,
                needed,
                available,
            });
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self, context: &'static str) -> ExtractResult<[u8; N]> {
        self.ensure(N as u64, context)?;
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ExtractError::TruncatedFile {
                    context,
                    needed: N as u64,
                    available: 0,
                }
            } else {
                ExtractError::Io(e)
            }
        })?;
        self.pos += N as u64;
        Ok(buf)
    }

    pub fn read_u16_le(&mut self, context: &'static str) -> ExtractResult<u16> {
        Ok(u16::from_le_bytes(self.read_array::<2>(context)?))
    }

    pub fn read_u32_le(&mut self, context: &'static str) -> ExtractResult<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>(context)?))
    }

    /// Read the 8-byte tag + little-endian size header at the cursor.
    pub fn read_chunk_header(&mut self) -> ExtractResult<ChunkHeader> {
        self.ensure(CHUNK_HEADER_LEN, "chunk header")?;
        let tag = self.read_array::<4>("chunk tag")?;
        let size = self.read_u32_le("chunk size")?;
        Ok(ChunkHeader { tag, size })
    }

    /// Advance the cursor by `n` bytes without interpreting them.
    pub fn skip(&mut self, n: u64, context: &'static str) -> ExtractResult<()> {
        self.ensure(n, context)?;
        let offset = i64::try_from(n).map_err(|_| ExtractError::TruncatedFile {
            context,
            needed: n,
            available: self.remaining(),
        })?;
        self.inner.seek(SeekFrom::Current(offset))?;
        self.pos += n;
        Ok(())
    }

    /// Skip a chunk body of `size` bytes.
    pub fn skip_chunk(&mut self, size: u32) -> ExtractResult<()> {
        self.skip(u64::from(size), "chunk body")
    }

    /// Consume the `RIFF` header and its form type.
    ///
    /// Mismatched magic is logged rather than rejected; only the audio format
    /// code decides whether a file is decodable.
    pub fn read_riff_header(&mut self) -> ExtractResult<RiffHeader> {
        let header = self.read_chunk_header()?;
        let form = self.read_array::<4>("RIFF form type")?;
        if !header.is(&RIFF_TAG) {
            warn!("expected RIFF tag, found {}", tag_name(&header.tag));
        }
        if form != WAVE_FORM {
            warn!("expected WAVE form type, found {}", tag_name(&form));
        }
        debug!("RIFF header: declared size {}, form {}", header.size, tag_name(&form));
        Ok(RiffHeader { header, form })
    }

    /// Walk chunk headers until one tagged `target` is found.
    ///
    /// On success the cursor sits at the start of the matching chunk's body.
    /// Every non-matching chunk is skipped whole, so the scan advances at least
    /// eight bytes per step and ends when the stream cannot hold another header.
    pub fn find_chunk(&mut self, target: &[u8; 4]) -> ExtractResult<ChunkHeader> {
        loop {
            if self.remaining() < CHUNK_HEADER_LEN {
                return Err(ExtractError::ChunkNotFound {
                    tag: tag_name(target),
                });
            }
            let header = self.read_chunk_header()?;
            if header.is(target) {
                debug!("found chunk {header} at offset {}", self.pos - CHUNK_HEADER_LEN);
                return Ok(header);
            }
            debug!("skipping chunk {header}");
            self.skip_chunk(header.size)?;
        }
    }

    /// Hand over the underlying reader, limited to the next `size` bytes.
    pub fn into_body(self, size: u32) -> std::io::Take<R> {
        self.inner.take(u64::from(size))
    }
}
