//! Seekable byte sources.
//!
//! The structure resolution core reads everything through [`ByteSource`]: a
//! finite, seekable source that hands out one byte at a time and can peek one
//! byte ahead. [`MemoryCursor`] is the in-memory implementation used for whole
//! files and for decoded stream contents.
//!
//! Each source instance carries a [`SourceId`]. Memoized per-source state (the
//! brute-force location table) is keyed by that identity, never by content, so
//! reopening the same bytes as a new session starts from a clean slate.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one byte source instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    /// Allocate an identity that no other source in this process shares.
    pub fn fresh() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A seekable, finite byte source with one byte of lookahead.
///
/// Only one logical scan may run against a source at a time; callers hold it
/// by `&mut` for the duration of a seek-and-read sequence.
pub trait ByteSource {
    /// Total length in bytes, known up front.
    fn len(&self) -> u64;

    /// Current absolute position.
    fn position(&self) -> u64;

    /// Move to an absolute position. Seeking to `len()` is allowed (EOF).
    fn seek(&mut self, pos: u64) -> Result<()>;

    /// Read the byte at the current position and advance past it.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Return the byte at the current position without advancing.
    fn peek(&mut self) -> Result<Option<u8>>;

    /// Identity of this source instance.
    fn source_id(&self) -> SourceId;

    /// True when the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the position is at or past the end.
    fn is_eof(&self) -> bool {
        self.position() >= self.len()
    }

    /// Advance by one byte.
    fn advance(&mut self) -> Result<()> {
        self.read_byte().map(|_| ())
    }

    /// Copy `len` bytes starting at `start`, clamped to the end of the source.
    ///
    /// The cursor is left just past the last byte copied.
    fn read_range(&mut self, start: u64, len: usize) -> Result<Vec<u8>> {
        self.seek(start)?;
        let mut out = Vec::with_capacity(len.min(self.len().saturating_sub(start) as usize));
        while out.len() < len {
            match self.read_byte()? {
                Some(b) => out.push(b),
                None => break,
            }
        }
        Ok(out)
    }
}

/// In-memory [`ByteSource`] backed by [`Bytes`].
#[derive(Debug)]
pub struct MemoryCursor {
    data: Bytes,
    pos: u64,
    id: SourceId,
}

impl MemoryCursor {
    /// Wrap a buffer. The cursor starts at offset 0.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            id: SourceId::fresh(),
        }
    }

    /// Read an entire reader into memory.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Self::new(buf))
    }

    /// The underlying buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl ByteSource for MemoryCursor {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.len() {
            return Err(Error::OffsetOutOfRange {
                offset: pos,
                len: self.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let b = self.data.get(self.pos as usize).copied();
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.data.get(self.pos as usize).copied())
    }

    fn source_id(&self) -> SourceId {
        self.id
    }

    fn read_range(&mut self, start: u64, len: usize) -> Result<Vec<u8>> {
        self.seek(start)?;
        let from = start as usize;
        let to = from.saturating_add(len).min(self.data.len());
        self.pos = to as u64;
        Ok(self.data[from..to].to_vec())
    }
}
