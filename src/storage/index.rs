//! # Memory-Mapped Offset Index
//!
//! The index maps a record's offset relative to its segment's base to the
//! absolute byte position of that record in the store file. Entries are a
//! fixed 12 bytes, so entry `n` always lives at byte `n * 12` and lookups
//! are pure pointer arithmetic into the mapping.
//!
//! ## Pre-Sizing
//!
//! On open the file is grown to the configured maximum index size before
//! it is mapped. The mapping must cover the largest size the file can ever
//! reach, because entries are written through the mapping as the logical
//! `size` grows; remapping on every write would defeat the point. The
//! kernel materializes pages lazily through page faults, so the padding
//! costs address space, not resident memory.
//!
//! Closing reverses the trick: the file is truncated back to the logical
//! data size after syncing, which is exactly what the next open reads to
//! learn how many entries are present. A crash skips the truncate and the
//! padded tail of zeroes is treated as data on reopen; the segment above
//! recovers by reading the last entry, matching the store's
//! recover-by-ignore handling of unindexed tails.
//!
//! ## Concurrency
//!
//! The index has no internal lock. It is only reached through a segment,
//! which is only reached through the log's readers-writer lock.

use std::fs::File;

use memmap2::MmapMut;
use zerocopy::big_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::error::{Error, Result};

use super::ENTRY_WIDTH;

/// On-disk layout of one index entry. Both fields are big-endian.
#[repr(C)]
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, Immutable)]
struct IndexEntry {
    relative_offset: U32,
    position: U64,
}

/// Fixed-width, memory-mapped offset index for one segment.
pub struct Index {
    file: File,
    mmap: MmapMut,
    size: u64,
}

impl Index {
    /// Opens an index over `file`, growing it to `max_index_bytes` and
    /// mapping it read-write.
    ///
    /// The file's length before growing is taken as the logical data
    /// size, so a cleanly closed index reopens with its entries intact.
    pub fn new(file: File, max_index_bytes: u64) -> Result<Index> {
        let size = file.metadata()?.len();
        file.set_len(max_index_bytes)?;

        // SAFETY: MmapMut::map_mut is unsafe because external modification
        // of the mapped file is undefined behavior. This is safe because:
        // 1. Segment files are owned exclusively by their segment; the log
        //    directory is not shared with other processes.
        // 2. The file was just extended to max_index_bytes, so the mapping
        //    covers every byte write() will ever touch.
        // 3. The mmap's lifetime is tied to Index, preventing use after
        //    unmap, and all access is bounds-checked against `size`.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Index { file, mmap, size })
    }

    /// Reads the entry at position `at`, returning its relative offset and
    /// store position. `-1` selects the last entry.
    pub fn read(&self, at: i64) -> Result<(u32, u64)> {
        // The mapping can be shorter than the logical size if the index
        // limit was lowered between runs; entries beyond it are unreadable.
        let entries = self.size.min(self.mmap.len() as u64) / ENTRY_WIDTH;
        if entries == 0 {
            return Err(Error::IndexEmpty);
        }

        let entry = if at == -1 { entries - 1 } else { at as u64 };
        if entry >= entries {
            return Err(Error::IndexEmpty);
        }

        let entry = self.entry_at((entry * ENTRY_WIDTH) as usize);
        Ok((entry.relative_offset.get(), entry.position.get()))
    }

    /// Appends an entry at the logical end of the index.
    pub fn write(&mut self, relative_offset: u32, position: u64) -> Result<()> {
        if (self.mmap.len() as u64) < self.size + ENTRY_WIDTH {
            return Err(Error::IndexFull);
        }

        let entry = IndexEntry {
            relative_offset: U32::new(relative_offset),
            position: U64::new(position),
        };

        let start = self.size as usize;
        self.mmap[start..start + ENTRY_WIDTH as usize].copy_from_slice(entry.as_bytes());
        self.size += ENTRY_WIDTH;

        Ok(())
    }

    /// Logical size in bytes of the entries written so far. Distinct from
    /// the file size, which stays padded to the maximum while open.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Syncs the mapping and the file, then truncates the file back to
    /// the logical size so the next open recovers the entry count.
    pub fn close(self) -> Result<()> {
        self.mmap.flush()?;
        self.file.sync_all()?;
        self.file.set_len(self.size)?;
        Ok(())
    }

    fn entry_at(&self, start: usize) -> IndexEntry {
        let bytes = &self.mmap[start..start + ENTRY_WIDTH as usize];
        // The slice is exactly one entry wide and the entry type has no
        // alignment requirement, so this cannot fail.
        IndexEntry::read_from_bytes(bytes).expect("index entry slice has entry width")
    }
}
