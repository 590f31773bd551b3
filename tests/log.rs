//! # Commit Log Integration Tests
//!
//! End-to-end coverage of the log over a real directory: append/read
//! round-trips, restart recovery, truncation, the whole-log byte reader,
//! and concurrent appenders.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use prost::Message;
use tempfile::tempdir;

use seglog::storage::ENTRY_WIDTH;
use seglog::{Config, Error, Log, Record};

fn record(payload: &[u8]) -> Record {
    Record::new(Bytes::copy_from_slice(payload))
}

#[test]
fn appends_assign_sequential_offsets() {
    let dir = tempdir().unwrap();
    let log = Log::new(dir.path(), Config::default()).unwrap();

    let k1 = log.append(&mut record(br#"{"v":1}"#)).unwrap();
    let k2 = log.append(&mut record(br#"{"v":2}"#)).unwrap();

    assert_eq!(k1, 0);
    assert_eq!(k2, 1);
    assert_eq!(log.read(k1).unwrap().value, Bytes::from_static(br#"{"v":1}"#));
    assert_eq!(log.read(k2).unwrap().value, Bytes::from_static(br#"{"v":2}"#));
}

#[test]
fn highest_offset_survives_restart() {
    let dir = tempdir().unwrap();

    let log = Log::new(dir.path(), Config::default()).unwrap();
    for i in 0..3u64 {
        log.append(&mut record(&i.to_be_bytes())).unwrap();
    }
    log.close().unwrap();

    let log = Log::new(dir.path(), Config::default()).unwrap();
    assert_eq!(log.highest_offset().unwrap(), 2);
    assert_eq!(log.lowest_offset().unwrap(), 0);
}

#[test]
fn records_survive_restart() {
    let dir = tempdir().unwrap();
    let payloads: Vec<Vec<u8>> = (0..7u8).map(|i| vec![i; i as usize + 1]).collect();

    let log = Log::new(dir.path(), Config::default()).unwrap();
    for payload in &payloads {
        log.append(&mut record(payload)).unwrap();
    }
    log.close().unwrap();

    let log = Log::new(dir.path(), Config::default()).unwrap();
    for (offset, payload) in payloads.iter().enumerate() {
        let read = log.read(offset as u64).unwrap();
        assert_eq!(read.value, Bytes::copy_from_slice(payload));
        assert_eq!(read.offset, offset as u64);
    }
}

#[test]
fn small_index_rolls_after_three_appends() {
    let dir = tempdir().unwrap();
    let config = Config {
        max_store_bytes: 1024,
        max_index_bytes: ENTRY_WIDTH * 3,
        initial_offset: 0,
    };
    let log = Log::new(dir.path(), config).unwrap();

    for _ in 0..3 {
        log.append(&mut record(b"payload")).unwrap();
    }

    // Rollover happened on the third append.
    assert!(dir.path().join("3.store").exists());
    assert!(dir.path().join("3.index").exists());

    let offset = log.append(&mut record(b"payload")).unwrap();
    assert_eq!(offset, 3);
    assert_eq!(log.read(3).unwrap().offset, 3);
}

#[test]
fn truncate_removes_low_offsets() {
    let dir = tempdir().unwrap();
    let config = Config {
        max_store_bytes: 1024,
        max_index_bytes: ENTRY_WIDTH,
        initial_offset: 0,
    };
    let log = Log::new(dir.path(), config).unwrap();

    for i in 0..10u64 {
        log.append(&mut record(format!("value-{i}").as_bytes())).unwrap();
    }

    log.truncate(4).unwrap();

    assert!(matches!(
        log.read(3),
        Err(Error::OffsetOutOfRange { offset: 3 })
    ));
    let read = log.read(5).unwrap();
    assert_eq!(read.value, Bytes::from_static(b"value-5"));
    assert_eq!(read.offset, 5);
}

#[test]
fn empty_log_read_is_out_of_range() {
    let dir = tempdir().unwrap();
    let log = Log::new(dir.path(), Config::default()).unwrap();

    assert!(matches!(
        log.read(0),
        Err(Error::OffsetOutOfRange { offset: 0 })
    ));
}

#[test]
fn empty_payload_roundtrip() {
    let dir = tempdir().unwrap();
    let log = Log::new(dir.path(), Config::default()).unwrap();

    let offset = log.append(&mut record(b"")).unwrap();

    let read = log.read(offset).unwrap();
    assert!(read.value.is_empty());
    assert_eq!(read.offset, offset);
}

#[test]
fn reader_yields_every_record_in_append_order() {
    let dir = tempdir().unwrap();
    let config = Config {
        max_store_bytes: 1024,
        max_index_bytes: ENTRY_WIDTH * 2,
        initial_offset: 0,
    };
    let log = Log::new(dir.path(), config).unwrap();

    let mut expected = Vec::new();
    for i in 0..5u64 {
        let mut rec = record(format!("entry-{i}").as_bytes());
        log.append(&mut rec).unwrap();
        let encoded = rec.encode_to_vec();
        expected.extend_from_slice(&(encoded.len() as u64).to_be_bytes());
        expected.extend_from_slice(&encoded);
    }

    let mut bytes = Vec::new();
    log.reader().unwrap().read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, expected);

    // The stream decodes back to the appended records.
    let mut cursor = 0;
    let mut offset = 0u64;
    while cursor < bytes.len() {
        let len = u64::from_be_bytes(bytes[cursor..cursor + 8].try_into().unwrap()) as usize;
        cursor += 8;
        let rec = Record::decode(&bytes[cursor..cursor + len]).unwrap();
        cursor += len;
        assert_eq!(rec.offset, offset);
        assert_eq!(rec.value, Bytes::from(format!("entry-{offset}")));
        offset += 1;
    }
    assert_eq!(offset, 5);
}

#[test]
fn restart_after_rollover_keeps_segment_boundaries() {
    let dir = tempdir().unwrap();
    let config = Config {
        max_store_bytes: 1024,
        max_index_bytes: ENTRY_WIDTH * 2,
        initial_offset: 0,
    };

    let log = Log::new(dir.path(), config).unwrap();
    for i in 0..6u64 {
        log.append(&mut record(&i.to_be_bytes())).unwrap();
    }
    log.close().unwrap();

    let log = Log::new(dir.path(), config).unwrap();
    assert_eq!(log.highest_offset().unwrap(), 5);
    for i in 0..6u64 {
        assert_eq!(log.read(i).unwrap().offset, i);
    }
    assert_eq!(log.append(&mut record(b"after restart")).unwrap(), 6);
}

#[test]
fn concurrent_appends_produce_gap_free_offsets() {
    let dir = tempdir().unwrap();
    let log = Arc::new(
        Log::new(
            dir.path(),
            Config {
                max_store_bytes: 4096,
                max_index_bytes: ENTRY_WIDTH * 8,
                initial_offset: 0,
            },
        )
        .unwrap(),
    );

    let mut handles = Vec::new();
    for worker in 0..4u8 {
        let log = Arc::clone(&log);
        handles.push(std::thread::spawn(move || {
            let mut offsets = Vec::new();
            for i in 0..25u8 {
                let offset = log.append(&mut record(&[worker, i])).unwrap();
                offsets.push(offset);
            }
            offsets
        }));
    }

    let mut all_offsets: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all_offsets.sort_unstable();

    let expected: Vec<u64> = (0..100).collect();
    assert_eq!(all_offsets, expected);

    for offset in 0..100u64 {
        assert_eq!(log.read(offset).unwrap().offset, offset);
    }
}

mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn appended_payloads_read_back(
            payloads in prop::collection::vec(
                prop::collection::vec(any::<u8>(), 0..4096),
                1..48,
            ),
        ) {
            let dir = tempdir().unwrap();
            let config = Config {
                max_store_bytes: 4096,
                max_index_bytes: ENTRY_WIDTH * 16,
                initial_offset: 0,
            };
            let log = Log::new(dir.path(), config).unwrap();

            for (i, payload) in payloads.iter().enumerate() {
                let offset = log.append(&mut record(payload)).unwrap();
                prop_assert_eq!(offset, i as u64);
            }

            prop_assert_eq!(log.lowest_offset().unwrap(), 0);
            prop_assert_eq!(
                log.highest_offset().unwrap(),
                payloads.len() as u64 - 1
            );

            for (i, payload) in payloads.iter().enumerate() {
                let read = log.read(i as u64).unwrap();
                prop_assert_eq!(read.offset, i as u64);
                prop_assert_eq!(&read.value[..], payload.as_slice());
            }

            let out_of_range = matches!(
                log.read(payloads.len() as u64),
                Err(Error::OffsetOutOfRange { .. })
            );
            prop_assert!(out_of_range);
        }

        #[test]
        fn restart_preserves_every_record(
            payloads in prop::collection::vec(
                prop::collection::vec(any::<u8>(), 0..512),
                1..24,
            ),
        ) {
            let dir = tempdir().unwrap();
            let config = Config {
                max_store_bytes: 512,
                max_index_bytes: ENTRY_WIDTH * 4,
                initial_offset: 0,
            };

            let log = Log::new(dir.path(), config).unwrap();
            for payload in &payloads {
                log.append(&mut record(payload)).unwrap();
            }
            log.close().unwrap();

            let log = Log::new(dir.path(), config).unwrap();
            prop_assert_eq!(
                log.highest_offset().unwrap(),
                payloads.len() as u64 - 1
            );
            for (i, payload) in payloads.iter().enumerate() {
                let read = log.read(i as u64).unwrap();
                prop_assert_eq!(&read.value[..], payload.as_slice());
            }
        }
    }
}
