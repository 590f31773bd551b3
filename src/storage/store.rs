//! # Byte-Stream Store
//!
//! The store is the append-only data file of a segment. Records arrive as
//! opaque byte slices and are written as an 8-byte big-endian length
//! prefix followed by the bytes themselves. The store hands back the byte
//! position of each append so the index can point at it; it never
//! interprets the bytes it holds.
//!
//! ## Buffering
//!
//! Appends go through a `BufWriter` to batch small records into fewer
//! syscalls. Reads use positional I/O against the underlying file handle,
//! which cannot see buffered bytes, so every read path flushes the writer
//! first while holding the same mutex that appends take. That flush is a
//! correctness requirement, not a tuning knob: a read issued after an
//! append must observe that append's bytes.
//!
//! ## Durability
//!
//! The store does not sync on append. Bytes are durable to the OS page
//! cache once flushed; `close` flushes the writer so a clean shutdown
//! leaves nothing behind in userspace buffers.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::os::unix::fs::FileExt;

use parking_lot::Mutex;

use crate::error::Result;

use super::LEN_WIDTH;

struct StoreInner {
    writer: BufWriter<File>,
    size: u64,
}

/// Append-only, length-prefixed record file.
pub struct Store {
    inner: Mutex<StoreInner>,
}

impl Store {
    /// Wraps an open file, picking up its current size.
    ///
    /// The file is expected to be opened in append mode so buffered
    /// writes always land at the end regardless of read activity.
    pub fn new(file: File) -> Result<Store> {
        let size = file.metadata()?.len();

        Ok(Store {
            inner: Mutex::new(StoreInner {
                writer: BufWriter::new(file),
                size,
            }),
        })
    }

    /// Appends a length-prefixed record, returning the number of bytes
    /// written and the position the record starts at.
    pub fn append(&self, payload: &[u8]) -> Result<(u64, u64)> {
        let mut inner = self.inner.lock();

        let position = inner.size;
        inner.writer.write_all(&(payload.len() as u64).to_be_bytes())?;
        inner.writer.write_all(payload)?;

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;

        Ok((written, position))
    }

    /// Reads the record starting at `position`.
    pub fn read(&self, position: u64) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        let file = inner.writer.get_ref();

        let mut len_buf = [0u8; LEN_WIDTH as usize];
        file.read_exact_at(&mut len_buf, position)?;

        let mut payload = vec![0u8; u64::from_be_bytes(len_buf) as usize];
        file.read_exact_at(&mut payload, position + LEN_WIDTH)?;

        Ok(payload)
    }

    /// Returns an independent reader over the store's bytes from position
    /// zero, flushing first so it observes every prior append.
    pub fn reader(&self) -> Result<StoreReader> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        Ok(StoreReader {
            file: inner.writer.get_ref().try_clone()?,
            position: 0,
        })
    }

    /// Current size in bytes, counting buffered but unflushed appends.
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Flushes buffered appends and releases the file.
    pub fn close(self) -> Result<()> {
        let mut inner = self.inner.into_inner();
        inner.writer.flush()?;
        Ok(())
    }
}

/// Positional reader over one store file.
///
/// Holds a duplicated handle, so it stays valid independent of the store's
/// own locking and keeps its own cursor.
pub struct StoreReader {
    file: File,
    position: u64,
}

impl Read for StoreReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.file.read_at(buf, self.position)?;
        self.position += n as u64;
        Ok(n)
    }
}
