//! # Log Segment
//!
//! A segment binds one store and one index that share a base offset: the
//! absolute offset of the first record the segment holds (or would hold,
//! while empty). The segment owns record serialization and offset
//! assignment; the layers below it deal only in bytes and positions.
//!
//! ## Append Ordering
//!
//! Appends write the store before the index. A crash between the two
//! leaves an unindexed tail in the store, which the next open simply never
//! reaches because `next_offset` is recomputed from the last index entry.
//! The reverse order would leave an index entry pointing at bytes that
//! were never written.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use prost::Message;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::Record;

use super::{Index, Store, StoreReader, INDEX_FILE_EXTENSION, STORE_FILE_EXTENSION};

/// One contiguous slice of the log's offset space, backed by a store and
/// index file pair.
pub struct Segment {
    store: Store,
    index: Index,
    store_path: PathBuf,
    index_path: PathBuf,
    base_offset: u64,
    next_offset: u64,
    config: Config,
}

impl Segment {
    /// Opens the segment for `base_offset` inside `dir`, creating its
    /// files if they do not exist yet.
    ///
    /// `next_offset` resumes after the last indexed record, or starts at
    /// the base offset for a fresh segment.
    pub fn new(dir: &Path, base_offset: u64, config: &Config) -> Result<Segment> {
        let store_path = dir.join(format!("{base_offset}.{STORE_FILE_EXTENSION}"));
        let store_file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&store_path)?;
        let store = Store::new(store_file)?;

        let index_path = dir.join(format!("{base_offset}.{INDEX_FILE_EXTENSION}"));
        let index_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&index_path)?;
        let index = Index::new(index_file, config.max_index_bytes)?;

        let next_offset = match index.read(-1) {
            Ok((relative_offset, _)) => base_offset + u64::from(relative_offset) + 1,
            Err(Error::IndexEmpty) => base_offset,
            Err(e) => return Err(e),
        };

        Ok(Segment {
            store,
            index,
            store_path,
            index_path,
            base_offset,
            next_offset,
            config: *config,
        })
    }

    /// Appends a record, stamping it with the next offset and returning
    /// that offset.
    pub fn append(&mut self, record: &mut Record) -> Result<u64> {
        let offset = self.next_offset;
        record.offset = offset;

        let encoded = record.encode_to_vec();
        let (_, position) = self.store.append(&encoded)?;
        self.index
            .write((offset - self.base_offset) as u32, position)?;

        self.next_offset += 1;
        Ok(offset)
    }

    /// Reads the record stored at the absolute `offset`.
    pub fn read(&self, offset: u64) -> Result<Record> {
        let relative = offset
            .checked_sub(self.base_offset)
            .ok_or(Error::OffsetOutOfRange { offset })?;

        let (_, position) = self.index.read(relative as i64)?;
        let encoded = self.store.read(position)?;

        Ok(Record::decode(encoded.as_slice())?)
    }

    /// Whether either file has reached its configured capacity. The log
    /// rolls to a new segment when this turns true.
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.config.max_store_bytes
            || self.index.size() >= self.config.max_index_bytes
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Offset the next append will receive. Equals `base_offset` while the
    /// segment is empty.
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Reader over the raw store bytes from position zero.
    pub fn store_reader(&self) -> Result<StoreReader> {
        self.store.reader()
    }

    /// Closes the index (sync + truncate to logical size) and then the
    /// store (flush).
    pub fn close(self) -> Result<()> {
        self.index.close()?;
        self.store.close()?;
        Ok(())
    }

    /// Closes the segment and unlinks both of its files.
    pub fn remove(self) -> Result<()> {
        let store_path = self.store_path.clone();
        let index_path = self.index_path.clone();

        self.close()?;
        fs::remove_file(&index_path)?;
        fs::remove_file(&store_path)?;
        Ok(())
    }
}
