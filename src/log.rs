//! # Commit Log
//!
//! The log stitches an ordered collection of segments into one continuous
//! offset space over a single directory. Exactly one segment, always the
//! last, is active: appends go to it, and when a capacity limit is hit the
//! log seals it and rolls a fresh segment at the next offset. Reads route
//! by offset to whichever segment's range contains it.
//!
//! ## Directory Layout
//!
//! Each segment contributes a `{base_offset}.store` and
//! `{base_offset}.index` pair. Opening a directory discovers segments by
//! parsing file stems as offsets; both extensions yield the same base, so
//! the scan deduplicates before opening. Files whose stem is not a number
//! do not belong to the log and are skipped with a warning.
//!
//! ## Concurrency
//!
//! One readers-writer lock guards the segment list. Mutating operations
//! (`append`, `truncate`, `close`, `remove`) take it exclusively; `read`,
//! the offset accessors and `reader` share it. Appends are therefore
//! totally ordered, and a read that starts after an append returned offset
//! `k` is guaranteed to find `k`.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::storage::{Segment, StoreReader};

/// The narrow interface embedding hosts consume.
///
/// Servers and replicators only ever append records and read them back by
/// offset; taking this trait instead of [`Log`] keeps them decoupled from
/// segment management.
pub trait CommitLog {
    fn append(&self, record: &mut Record) -> Result<u64>;
    fn read(&self, offset: u64) -> Result<Record>;
}

struct LogInner {
    segments: Vec<Segment>,
    closed: bool,
}

impl LogInner {
    /// The active segment is the last one. Present on every open log:
    /// opening creates at least one segment and truncation refills an
    /// emptied list.
    fn active(&mut self) -> &mut Segment {
        self.segments.last_mut().expect("open log has an active segment")
    }
}

/// An append-only segmented commit log rooted at one directory.
pub struct Log {
    dir: PathBuf,
    config: Config,
    inner: RwLock<LogInner>,
}

impl Log {
    /// Opens the log in `dir`, creating the directory and an initial
    /// segment if none exist yet.
    ///
    /// Existing segments are discovered from the directory, opened in
    /// ascending base-offset order, and the last becomes active.
    pub fn new(dir: impl AsRef<Path>, config: Config) -> Result<Log> {
        let dir = dir.as_ref().to_path_buf();
        let config = config.resolved();

        fs::create_dir_all(&dir)?;

        let mut base_offsets = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => match stem.parse::<u64>() {
                    Ok(base_offset) => base_offsets.push(base_offset),
                    Err(_) => warn!(
                        file = %path.display(),
                        "skipping non-segment file in log directory"
                    ),
                },
                None => warn!(
                    file = %path.display(),
                    "skipping non-segment file in log directory"
                ),
            }
        }

        // Every base offset appears once per extension.
        base_offsets.sort_unstable();
        base_offsets.dedup();

        let mut segments = Vec::with_capacity(base_offsets.len().max(1));
        for base_offset in base_offsets {
            segments.push(Segment::new(&dir, base_offset, &config)?);
        }
        if segments.is_empty() {
            segments.push(Segment::new(&dir, config.initial_offset, &config)?);
        }

        info!(
            dir = %dir.display(),
            segments = segments.len(),
            "commit log opened"
        );

        Ok(Log {
            dir,
            config,
            inner: RwLock::new(LogInner {
                segments,
                closed: false,
            }),
        })
    }

    /// Appends a record to the active segment, rolling to a new segment
    /// afterwards if a capacity limit was reached. Returns the offset the
    /// record was stamped with.
    pub fn append(&self, record: &mut Record) -> Result<u64> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(Error::Closed);
        }

        // Capacity is normally checked after each append, so a full index
        // only surfaces when the last rollover never made it to disk.
        // Treat it as the rollover signal it is and retry once.
        let offset = match inner.active().append(record) {
            Ok(offset) => offset,
            Err(Error::IndexFull) => {
                let base_offset = inner.active().next_offset();
                debug!(base_offset, "active segment index is full; rolling over");
                let segment = Segment::new(&self.dir, base_offset, &self.config)?;
                inner.segments.push(segment);
                inner.active().append(record)?
            }
            Err(e) => return Err(e),
        };

        if inner.active().is_maxed() {
            debug!(base_offset = offset + 1, "rolling over to a new segment");
            let segment = Segment::new(&self.dir, offset + 1, &self.config)?;
            inner.segments.push(segment);
        }

        Ok(offset)
    }

    /// Reads the record at `offset`.
    pub fn read(&self, offset: u64) -> Result<Record> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(Error::Closed);
        }

        let segment = inner
            .segments
            .iter()
            .find(|s| s.base_offset() <= offset && offset < s.next_offset())
            .ok_or(Error::OffsetOutOfRange { offset })?;

        segment.read(offset)
    }

    /// Base offset of the oldest retained segment.
    pub fn lowest_offset(&self) -> Result<u64> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(Error::Closed);
        }

        Ok(inner.segments[0].base_offset())
    }

    /// Offset of the most recently appended record, or 0 for a log that
    /// has never been appended to. Unaffected by an empty segment freshly
    /// created by rollover.
    pub fn highest_offset(&self) -> Result<u64> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(Error::Closed);
        }

        let next_offset = inner
            .segments
            .last()
            .map(Segment::next_offset)
            .unwrap_or(0);
        Ok(next_offset.saturating_sub(1))
    }

    /// Removes every segment whose records all have offsets at or below
    /// `lowest`, reclaiming their disk space.
    ///
    /// If every segment qualifies, a fresh one is created at the old next
    /// offset so the log stays appendable.
    pub fn truncate(&self, lowest: u64) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(Error::Closed);
        }

        let last_next_offset = inner.active().next_offset();

        let mut retained = Vec::with_capacity(inner.segments.len());
        for segment in std::mem::take(&mut inner.segments) {
            if segment.next_offset() <= lowest + 1 {
                debug!(
                    base_offset = segment.base_offset(),
                    "removing truncated segment"
                );
                segment.remove()?;
            } else {
                retained.push(segment);
            }
        }

        if retained.is_empty() {
            retained.push(Segment::new(&self.dir, last_next_offset, &self.config)?);
        }
        inner.segments = retained;

        Ok(())
    }

    /// Returns a reader over the whole log's raw store bytes: every
    /// segment's store from position zero, concatenated in segment order.
    pub fn reader(&self) -> Result<LogReader> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(Error::Closed);
        }

        let mut readers = Vec::with_capacity(inner.segments.len());
        for segment in &inner.segments {
            readers.push(segment.store_reader()?);
        }

        Ok(LogReader {
            readers,
            current: 0,
        })
    }

    /// Closes every segment in order, propagating the first error.
    /// Subsequent operations fail with [`Error::Closed`]; closing again is
    /// a no-op.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Ok(());
        }
        inner.closed = true;

        info!(dir = %self.dir.display(), "closing commit log");
        for segment in std::mem::take(&mut inner.segments) {
            segment.close()?;
        }

        Ok(())
    }

    /// Closes the log and deletes its directory tree.
    pub fn remove(&self) -> Result<()> {
        self.close()?;
        fs::remove_dir_all(&self.dir)?;
        Ok(())
    }

    /// Destroys the log's data and rebuilds a fresh log at the same
    /// directory with the same configuration.
    pub fn reset(self) -> Result<Log> {
        self.remove()?;
        Log::new(&self.dir, self.config)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CommitLog for Log {
    fn append(&self, record: &mut Record) -> Result<u64> {
        Log::append(self, record)
    }

    fn read(&self, offset: u64) -> Result<Record> {
        Log::read(self, offset)
    }
}

/// Concatenated byte stream over every segment's store file.
///
/// Each underlying reader keeps its own position and is driven to
/// completion before the next one starts.
pub struct LogReader {
    readers: Vec<StoreReader>,
    current: usize,
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.current < self.readers.len() {
            let n = self.readers[self.current].read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            self.current += 1;
        }
        Ok(0)
    }
}
