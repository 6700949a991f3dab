use std::io::{self, Read};

use super::IO_BLOCK;
use super::digest::{hash_reader, parse_record};
use crate::layout;
use crate::runner::result::{ChunkOutcome, ChunkStatus};
use crate::store::ChunkStore;

/// Re-reads a chunk and checks it against its recorded digest. Read-only.
#[derive(Copy, Clone, Debug, Default)]
pub struct ChunkVerifier;

impl ChunkVerifier {
    /// `expected_len` is known right after a write; a validate pass over an
    /// existing directory has no record of sizes and passes `None`.
    #[must_use]
    pub fn verify(
        &self,
        store: &dyn ChunkStore,
        index: u64,
        expected_len: Option<u64>,
    ) -> ChunkOutcome {
        match Self::check(store, index, expected_len) {
            Ok(outcome) => outcome,
            Err(e) => ChunkOutcome::io_error(index, 0, &e),
        }
    }

    fn check(
        store: &dyn ChunkStore,
        index: u64,
        expected_len: Option<u64>,
    ) -> io::Result<ChunkOutcome> {
        let data_name = layout::data_name(index);

        let mut text = String::new();
        store
            .open(&layout::checksum_name(index))?
            .read_to_string(&mut text)?;
        let expected = parse_record(&text)?;

        if let Some(want) = expected_len {
            let got = store.file_len(&data_name)?;
            if got != want {
                return Err(wrong_length(got, want));
            }
        }

        let mut reader = store.open(&data_name)?;
        let mut buf = vec![0u8; IO_BLOCK];
        let (actual, bytes) = hash_reader(&mut *reader, &mut buf)?;
        if let Some(want) = expected_len
            && bytes != want
        {
            return Err(wrong_length(bytes, want));
        }

        let status = if actual.eq_ignore_ascii_case(&expected) {
            ChunkStatus::Ok
        } else {
            ChunkStatus::Mismatch { expected, actual }
        };
        Ok(ChunkOutcome {
            index,
            bytes,
            status,
        })
    }
}

/// Reported as `UnexpectedEof` in both directions: the data no longer ends
/// where the write ended.
fn wrong_length(got: u64, want: u64) -> io::Error {
    let detail = if got < want { "truncated" } else { "overlong" };
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("data file {detail}: {got} bytes, expected {want}"),
    )
}
