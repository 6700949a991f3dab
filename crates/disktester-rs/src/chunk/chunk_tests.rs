use std::io;

use tempfile::TempDir;

use super::verifier::ChunkVerifier;
use super::writer::ChunkWriter;
use super::*;
use crate::layout;
use crate::plan::ChunkDescriptor;
use crate::runner::result::ChunkStatus;
use crate::store::ChunkStore;
use crate::store::dir::DirStore;
use crate::store::memory::MemStore;

fn descriptor(index: u64, size_bytes: u64) -> ChunkDescriptor {
    ChunkDescriptor { index, size_bytes }
}

fn write_chunk(store: &dyn ChunkStore, index: u64, size: u64) -> ChunkFile {
    ChunkWriter
        .write(store, descriptor(index, size), 42 + index)
        .expect("chunk write")
}

fn io_kind(status: &ChunkStatus) -> Option<io::ErrorKind> {
    match status {
        ChunkStatus::IoError { kind, .. } => Some(*kind),
        _ => None,
    }
}

#[test]
fn written_chunk_verifies() {
    let store = MemStore::new();
    for (index, size) in [(0, 1), (1, 1024), (2, IO_BLOCK as u64 + 17)] {
        let file = write_chunk(&store, index, size);
        assert_eq!(file.size_bytes, size);
        assert_eq!(file.digest.len(), digest::DIGEST_HEX_LEN);

        let outcome = ChunkVerifier.verify(&store, index, Some(size));
        assert_eq!(outcome.status, ChunkStatus::Ok, "chunk {index}");
        assert_eq!(outcome.bytes, size);
    }
}

#[test]
fn checksum_file_holds_the_digest() {
    let store = MemStore::new();
    let file = write_chunk(&store, 3, 4096);

    let record = store.get(&layout::checksum_name(3)).expect("checksum file");
    let text = String::from_utf8(record).expect("utf8 record");
    assert_eq!(text.trim(), file.digest);
    assert_eq!(
        store.file_len(&layout::data_name(3)).expect("data len"),
        4096
    );
}

#[test]
fn same_seed_writes_same_bytes() {
    let a = MemStore::new();
    let b = MemStore::new();
    let fa = ChunkWriter.write(&a, descriptor(0, 5000), 7).expect("write a");
    let fb = ChunkWriter.write(&b, descriptor(0, 5000), 7).expect("write b");
    let fc = ChunkWriter.write(&b, descriptor(1, 5000), 8).expect("write c");

    assert_eq!(fa.digest, fb.digest);
    assert_ne!(fa.digest, fc.digest);
}

#[test]
fn corrupted_byte_is_a_mismatch() {
    let store = MemStore::new();
    let file = write_chunk(&store, 0, 1024);
    assert!(store.corrupt(&layout::data_name(0), 500));

    let outcome = ChunkVerifier.verify(&store, 0, Some(1024));
    match outcome.status {
        ChunkStatus::Mismatch { expected, actual } => {
            assert_eq!(expected, file.digest);
            assert_ne!(actual, file.digest);
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
    assert_eq!(outcome.bytes, 1024);
}

#[test]
fn any_flipped_byte_is_detected() {
    let store = MemStore::new();
    write_chunk(&store, 0, 64);
    let name = layout::data_name(0);
    let pristine = store.get(&name).expect("data");

    for offset in 0..pristine.len() {
        store.put(&name, &pristine);
        assert!(store.corrupt(&name, offset));
        let outcome = ChunkVerifier.verify(&store, 0, Some(64));
        assert!(
            matches!(outcome.status, ChunkStatus::Mismatch { .. }),
            "offset {offset}"
        );
    }
}

#[test]
fn missing_checksum_is_io_error() {
    let store = MemStore::new();
    write_chunk(&store, 0, 128);
    store
        .remove(&layout::checksum_name(0))
        .expect("remove checksum");

    let outcome = ChunkVerifier.verify(&store, 0, None);
    assert_eq!(io_kind(&outcome.status), Some(io::ErrorKind::NotFound));
}

#[test]
fn missing_data_is_io_error() {
    let store = MemStore::new();
    write_chunk(&store, 0, 128);
    store.remove(&layout::data_name(0)).expect("remove data");

    let outcome = ChunkVerifier.verify(&store, 0, Some(128));
    assert_eq!(io_kind(&outcome.status), Some(io::ErrorKind::NotFound));
}

#[test]
fn truncated_data_with_known_length_is_io_error() {
    let store = MemStore::new();
    write_chunk(&store, 0, 2048);
    assert!(store.truncate(&layout::data_name(0), 1000));

    let outcome = ChunkVerifier.verify(&store, 0, Some(2048));
    assert_eq!(io_kind(&outcome.status), Some(io::ErrorKind::UnexpectedEof));
}

#[test]
fn truncated_data_without_known_length_is_a_mismatch() {
    let store = MemStore::new();
    write_chunk(&store, 0, 2048);
    assert!(store.truncate(&layout::data_name(0), 1000));

    let outcome = ChunkVerifier.verify(&store, 0, None);
    assert!(matches!(outcome.status, ChunkStatus::Mismatch { .. }));
    assert_eq!(outcome.bytes, 1000);
}

#[test]
fn overlong_data_with_known_length_is_io_error() {
    let store = MemStore::new();
    write_chunk(&store, 0, 1024);
    let name = layout::data_name(0);
    let mut data = store.get(&name).expect("data");
    data.extend_from_slice(b"extra");
    store.put(&name, &data);

    let outcome = ChunkVerifier.verify(&store, 0, Some(1024));
    assert_eq!(io_kind(&outcome.status), Some(io::ErrorKind::UnexpectedEof));
}

#[test]
fn malformed_record_is_io_error() {
    let store = MemStore::new();
    write_chunk(&store, 0, 256);
    store.put(&layout::checksum_name(0), b"not a digest\n");

    let outcome = ChunkVerifier.verify(&store, 0, Some(256));
    assert_eq!(io_kind(&outcome.status), Some(io::ErrorKind::InvalidData));
}

#[test]
fn uppercase_record_still_verifies() {
    let store = MemStore::new();
    let file = write_chunk(&store, 0, 256);
    let upper = format!("{}\n", file.digest.to_ascii_uppercase());
    store.put(&layout::checksum_name(0), upper.as_bytes());

    let outcome = ChunkVerifier.verify(&store, 0, Some(256));
    assert_eq!(outcome.status, ChunkStatus::Ok);
}

#[test]
fn full_store_fails_the_write() {
    let store = MemStore::with_capacity(1000);
    let err = ChunkWriter
        .write(&store, descriptor(4, 4096), 1)
        .expect_err("store is too small");

    assert_eq!(err.index(), 4);
    match err {
        crate::error::ChunkError::Io { source, .. } => {
            assert_eq!(source.kind(), io::ErrorKind::StorageFull);
        }
    }
    assert!(!store.contains(&layout::checksum_name(4)));
}

#[test]
fn failed_rewrite_drops_the_old_record() {
    let store = MemStore::with_capacity(2000);
    write_chunk(&store, 0, 1000);
    assert!(store.contains(&layout::checksum_name(0)));

    let err = ChunkWriter
        .write(&store, descriptor(0, 4096), 5)
        .expect_err("rewrite outgrows the store");
    assert_eq!(err.index(), 0);
    assert_eq!(err.written(), 2000);
    assert!(!store.contains(&layout::checksum_name(0)));
    assert_eq!(store.get(&layout::data_name(0)).map(|d| d.len()), Some(2000));

    let outcome = ChunkVerifier.verify(&store, 0, None);
    assert_eq!(io_kind(&outcome.status), Some(io::ErrorKind::NotFound));
}

#[test]
fn rewrite_replaces_the_record() {
    let store = MemStore::new();
    let first = write_chunk(&store, 0, 512);
    let second = ChunkWriter
        .write(&store, descriptor(0, 512), 99)
        .expect("rewrite");

    assert_ne!(first.digest, second.digest);
    let outcome = ChunkVerifier.verify(&store, 0, Some(512));
    assert_eq!(outcome.status, ChunkStatus::Ok);
}

#[test]
fn directory_store_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let store = DirStore::open(dir.path()).expect("open store");

    let file = write_chunk(&store, 0, IO_BLOCK as u64 * 2 + 3);
    assert!(dir.path().join(layout::data_name(0)).is_file());
    assert!(dir.path().join(layout::checksum_name(0)).is_file());

    let outcome = ChunkVerifier.verify(&store, 0, Some(file.size_bytes));
    assert_eq!(outcome.status, ChunkStatus::Ok);
}
