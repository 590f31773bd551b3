//! The record envelope.
//!
//! Records travel through the store as a protobuf message framed by the
//! store's 8-byte length prefix. The envelope carries two fields: the
//! opaque payload (`value`, field 1) and the offset the segment stamped at
//! append time (`offset`, field 2). Protobuf keeps the envelope
//! self-describing, so fields can be added later without breaking
//! previously written segments.

use bytes::Bytes;

/// The unit of storage.
///
/// `offset` is assigned by the segment during append and round-trips
/// through persistence; the value a caller sets before appending is
/// overwritten.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Record {
    #[prost(bytes = "bytes", tag = "1")]
    pub value: Bytes,
    #[prost(uint64, tag = "2")]
    pub offset: u64,
}

impl Record {
    /// Builds a record around a payload, leaving the offset unassigned.
    pub fn new(value: impl Into<Bytes>) -> Record {
        Record {
            value: value.into(),
            offset: 0,
        }
    }
}
