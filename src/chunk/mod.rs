//! Chunk framing.
//!
//! Every record in a 3DS file starts with a `u16` tag and a `u32` size that covers the
//! 6 byte header plus payload plus nested children. A reader walks the payload of a chunk,
//! then iterates its children with [`Chunk::read_next`] and finally jumps to the declared
//! end, which skips anything it did not understand.

pub mod tag;

use log::trace;

use crate::error::{Error, Result, Warning};
use crate::io::{Reader, Writer};

use std::io::{self, SeekFrom};

pub const HEADER_SIZE: u32 = 6;

/// Tag and size of a child found by [`Chunk::read_next`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkHeader {
    pub tag: u16,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub tag: u16,
    pub size: u32,
    pub start: u64,
    pub end: u64,
    cur: u64,
}

impl Chunk {
    /// Reads a bare header and leaves the reader at the start of the payload.
    pub fn read(r: &mut Reader) -> Result<Self> {
        let start = r.tell();
        let tag = r.u16()?;
        let size = r.u32()?;
        if size < HEADER_SIZE {
            return Err(Error::InvalidChunkSize {
                offset: start,
                size,
            });
        }
        Ok(Self {
            tag,
            size,
            start,
            end: start + size as u64,
            cur: start + HEADER_SIZE as u64,
        })
    }

    /// Reads a header expected to carry `expected`; `0` accepts any tag.
    pub fn read_start(r: &mut Reader, expected: u16) -> Result<Self> {
        let chunk = Self::read(r)?;
        if expected != 0 && chunk.tag != expected {
            r.warn(Warning::TagMismatch {
                expected,
                found: chunk.tag,
                offset: chunk.start,
            });
        }
        trace!(
            "{:indent$}{} ({:#06x}) size={}",
            "",
            tag::name(chunk.tag),
            chunk.tag,
            chunk.size,
            indent = r.depth * 2
        );
        r.depth += 1;
        Ok(chunk)
    }

    /// Marks the current position as the start of the children.
    pub fn read_tell(&mut self, r: &Reader) {
        self.cur = r.tell();
    }

    /// Steps to the next child, leaving the reader just past its header.
    ///
    /// Returns `None` once the children are exhausted, or when a child claims more bytes
    /// than its parent has left. The latter is reported as a warning and the rest of the
    /// parent is skipped.
    pub fn read_next(&mut self, r: &mut Reader) -> Result<Option<ChunkHeader>> {
        if self.cur >= self.end {
            return Ok(None);
        }
        r.seek(SeekFrom::Start(self.cur));
        let offset = self.cur;
        let tag = r.u16()?;
        let size = r.u32()?;
        if size < HEADER_SIZE {
            return Err(Error::InvalidChunkSize { offset, size });
        }
        self.cur += size as u64;
        trace!(
            "{:indent$}{} ({:#06x}) size={}",
            "",
            tag::name(tag),
            tag,
            size,
            indent = r.depth * 2
        );
        if self.cur > self.end {
            r.warn(Warning::ChunkOverrun { tag, offset });
            return Ok(None);
        }
        Ok(Some(ChunkHeader { tag, size }))
    }

    /// Rewinds over the header that [`Chunk::read_next`] just consumed.
    pub fn read_reset(&self, r: &mut Reader) {
        r.seek(SeekFrom::Current(-(HEADER_SIZE as i64)));
    }

    pub fn read_end(&self, r: &mut Reader) {
        r.depth = r.depth.saturating_sub(1);
        r.seek(SeekFrom::Start(self.end));
    }

    /// Writes a header with a size known up front.
    pub fn write<W: io::Write + io::Seek>(w: &mut Writer<W>, tag: u16, size: u32) -> Result<()> {
        w.u16(tag)?;
        w.u32(size)
    }

    /// Writes a placeholder header; [`Chunk::write_end`] patches the size.
    pub fn write_start<W: io::Write + io::Seek>(w: &mut Writer<W>, tag: u16) -> Result<Self> {
        let start = w.tell()?;
        Self::write(w, tag, 0)?;
        Ok(Self {
            tag,
            size: 0,
            start,
            end: start,
            cur: start,
        })
    }

    pub fn write_end<W: io::Write + io::Seek>(mut self, w: &mut Writer<W>) -> Result<()> {
        self.end = w.tell()?;
        self.size = (self.end - self.start) as u32;
        w.seek(SeekFrom::Start(self.start + 2))?;
        w.u32(self.size)?;
        w.seek(SeekFrom::Start(self.end))?;
        Ok(())
    }
}

/// Reports an unknown child. The caller's [`Chunk::read_end`] skips it.
pub(crate) fn unknown(r: &mut Reader, tag: u16) {
    let offset = r.tell().saturating_sub(HEADER_SIZE as u64);
    r.warn(Warning::UnknownChunk { tag, offset });
}

/// Writes `tag` around whatever `body` emits.
pub(crate) fn write_chunk<W, F>(w: &mut Writer<W>, tag: u16, body: F) -> Result<()>
where
    W: io::Write + io::Seek,
    F: FnOnce(&mut Writer<W>) -> Result<()>,
{
    let chunk = Chunk::write_start(w, tag)?;
    body(w)?;
    chunk.write_end(w)
}

/// Writes a payload-less chunk.
pub(crate) fn write_flag<W: io::Write + io::Seek>(w: &mut Writer<W>, tag: u16) -> Result<()> {
    Chunk::write(w, tag, HEADER_SIZE)
}
