//! Log configuration.
//!
//! A single [`Config`] value controls segment capacity and the starting
//! offset. Zero-valued byte limits mean "use the default"; the log resolves
//! them at open time so a `Config::default()` is immediately usable.
//!
//! `max_index_bytes` caps the memory-mapped index file, so together with
//! the fixed entry width it bounds how many records a segment can hold:
//! `max_index_bytes / 12` entries. `max_store_bytes` bounds the segment's
//! data file. Whichever limit is hit first seals the segment.

use tracing::warn;

use crate::storage::ENTRY_WIDTH;

pub const DEFAULT_MAX_STORE_BYTES: u64 = 1024;
pub const DEFAULT_MAX_INDEX_BYTES: u64 = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Maximum size of a segment's store file in bytes.
    pub max_store_bytes: u64,
    /// Maximum size of a segment's index file in bytes.
    pub max_index_bytes: u64,
    /// Offset assigned to the first record of a fresh log.
    pub initial_offset: u64,
}

impl Config {
    /// Substitutes defaults for zero-valued limits.
    ///
    /// A `max_index_bytes` that is not a multiple of the entry width is
    /// accepted, but the trailing partial slot can never hold an entry.
    pub(crate) fn resolved(mut self) -> Config {
        if self.max_store_bytes == 0 {
            self.max_store_bytes = DEFAULT_MAX_STORE_BYTES;
        }
        if self.max_index_bytes == 0 {
            self.max_index_bytes = DEFAULT_MAX_INDEX_BYTES;
        }
        if self.max_index_bytes % ENTRY_WIDTH != 0 {
            warn!(
                max_index_bytes = self.max_index_bytes,
                entry_width = ENTRY_WIDTH,
                "max_index_bytes is not a multiple of the index entry width"
            );
        }
        self
    }
}
