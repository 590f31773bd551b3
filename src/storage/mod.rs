//! # Storage Module
//!
//! This module provides the on-disk building blocks of the commit log:
//! the byte-stream store, the memory-mapped offset index, and the segment
//! that binds one of each under a shared base offset.
//!
//! ## Architecture Overview
//!
//! Every segment owns a pair of files named by the decimal base offset:
//!
//! ```text
//! log_dir/
//! ├── 0.store          # length-prefixed record envelopes
//! ├── 0.index          # fixed-width offset -> position entries
//! ├── 1024.store       # next segment after rollover
//! └── 1024.index
//! ```
//!
//! The store is append-only and buffered; the index is a memory-mapped
//! array of 12-byte entries mapping a record's offset relative to the
//! segment base to its absolute byte position in the store. Reads resolve
//! an offset through the index first, then fetch the envelope from the
//! store.
//!
//! ## Store File Format
//!
//! ```text
//! +----------------+------------------+----------------+---------
//! | length (8, BE) | envelope bytes   | length (8, BE) | ...
//! +----------------+------------------+----------------+---------
//! ```
//!
//! ## Index File Format
//!
//! ```text
//! +--------------------+------------------+
//! | rel offset (4, BE) | position (8, BE) |   x N entries
//! +--------------------+------------------+
//! ```
//!
//! While a segment is open its index file is padded out to the configured
//! maximum so the writable mapping never has to be re-established; a clean
//! close truncates the file back to the logical data size, which is what
//! reopening reads to recover the entry count.
//!
//! ## Thread Safety
//!
//! [`Store`] serializes appends and reads behind an internal mutex.
//! [`Index`] and [`Segment`] carry no locks of their own; they are only
//! reached through the log, whose readers-writer lock already provides
//! mutual exclusion.

mod index;
mod segment;
mod store;

pub use index::Index;
pub use segment::Segment;
pub use store::{Store, StoreReader};

/// Width of the store's record length prefix in bytes.
pub const LEN_WIDTH: u64 = 8;

/// Width of an index entry's relative-offset field in bytes.
pub const OFFSET_WIDTH: u64 = 4;

/// Width of an index entry's position field in bytes.
pub const POSITION_WIDTH: u64 = 8;

/// Total width of one index entry in bytes.
pub const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

pub const STORE_FILE_EXTENSION: &str = "store";
pub const INDEX_FILE_EXTENSION: &str = "index";
