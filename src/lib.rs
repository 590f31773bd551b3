//! # seglog - Append-Only Segmented Commit Log
//!
//! seglog is the storage engine of a distributed logging service: an
//! append-only log that accepts opaque binary records, assigns each a
//! monotonically increasing 64-bit offset, persists them durably across
//! process restarts, and serves point reads by offset. Records, once
//! written, are immutable.
//!
//! ## Quick Start
//!
//! ```ignore
//! use seglog::{Config, Log, Record};
//!
//! let log = Log::new("./data/log", Config::default())?;
//!
//! let mut record = Record::new("some event");
//! let offset = log.append(&mut record)?;
//!
//! let read = log.read(offset)?;
//! assert_eq!(read.value, record.value);
//!
//! log.close()?;
//! ```
//!
//! ## Architecture
//!
//! The log is a three-layer stack, leaves first:
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │          Log (offset space)          │   routes reads, rolls segments
//! ├─────────────────────────────────────┤
//! │       Segment (base offset)          │   stamps offsets, serializes
//! ├──────────────────┬──────────────────┤
//! │  Store (bytes)   │  Index (mmap)    │   length-prefixed data / 12-byte
//! └──────────────────┴──────────────────┘   offset -> position entries
//! ```
//!
//! Appends flow down: the active segment stamps the next offset,
//! serializes the record envelope, appends it to the store and records the
//! resulting position in the index. Reads flow the other way: the log
//! routes the offset to the owning segment, the index resolves it to a
//! store position, and the store yields the envelope bytes.
//!
//! ## File Layout
//!
//! ```text
//! log_dir/
//! ├── 0.store          # first segment's records
//! ├── 0.index          # first segment's offset index
//! ├── 3.store          # segment created by rollover at offset 3
//! └── 3.index
//! ```
//!
//! ## Thread Safety
//!
//! [`Log`] is `Send + Sync`; all methods take `&self` and serialize
//! internally through one readers-writer lock, so it can be shared across
//! threads behind an `Arc`. Offsets returned by `append` reflect the total
//! order of appends.
//!
//! ## Module Overview
//!
//! - [`log`]: the log itself, offset routing, rollover, truncation
//! - [`storage`]: store, memory-mapped index, segment lifecycle
//! - [`record`]: the protobuf record envelope
//! - [`config`]: capacity limits and the initial offset
//! - [`error`]: the error taxonomy

pub mod config;
pub mod error;
pub mod log;
pub mod record;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use log::{CommitLog, Log, LogReader};
pub use record::Record;
