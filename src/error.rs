//! Error types for commit log operations.
//!
//! All fallible operations return [`Result<T>`], aliased to
//! `Result<T, Error>`, so callers can propagate with `?` and match on the
//! category that matters to them. `OffsetOutOfRange` is the only variant a
//! well-behaved reader is expected to handle routinely: it means the
//! requested offset has not been written yet (or was truncated away), and
//! consumers such as replicators wait and retry on it.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The offset lies outside every segment's `[base_offset, next_offset)` range.
    #[error("offset out of range: {offset}")]
    OffsetOutOfRange { offset: u64 },

    /// The active segment's index has no room for another entry.
    ///
    /// The log checks capacity after each append and rolls segments
    /// proactively, so surfacing this usually means the index limit is
    /// misconfigured (for example, not a multiple of the entry width).
    #[error("index has no room for another entry")]
    IndexFull,

    /// The index holds no entry at the requested position.
    ///
    /// Reading a fresh index yields this; segment open relies on it to
    /// start at the base offset.
    #[error("index is empty")]
    IndexEmpty,

    /// Operation attempted on a closed log.
    #[error("log is closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode record envelope: {0}")]
    Decode(#[from] prost::DecodeError),
}
