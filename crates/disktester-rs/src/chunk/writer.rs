use std::io::{self, Write};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};

use super::digest::HashingWriter;
use super::{ChunkFile, IO_BLOCK};
use crate::error::ChunkError;
use crate::layout;
use crate::plan::ChunkDescriptor;
use crate::store::ChunkStore;

/// Fills one chunk with pseudo-random bytes and records its digest.
#[derive(Copy, Clone, Debug, Default)]
pub struct ChunkWriter;

impl ChunkWriter {
    /// Writes the data file, then the checksum file. Any record left by an
    /// earlier run is removed first, and the new one is only written once
    /// the data file is committed, so a failure in between leaves a data
    /// file with no record.
    ///
    /// # Errors
    /// Returns [`ChunkError::Io`] on the first failed write, carrying the
    /// data bytes already accepted; files already created are left in place.
    pub fn write(
        &self,
        store: &dyn ChunkStore,
        descriptor: ChunkDescriptor,
        seed: u64,
    ) -> Result<ChunkFile, ChunkError> {
        let index = descriptor.index;
        let fail = |e: io::Error| ChunkError::io(index, e);

        match store.remove(&layout::checksum_name(index)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(fail(e)),
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut hasher = Sha256::new();
        let block = usize::try_from(descriptor.size_bytes).map_or(IO_BLOCK, |n| n.min(IO_BLOCK));
        let mut buf = vec![0u8; block];

        let sink = store.create(&layout::data_name(index)).map_err(fail)?;
        let mut out = HashingWriter::new(sink, &mut hasher);
        let mut left = descriptor.size_bytes;
        while left > 0 {
            let n = usize::try_from(left).map_or(buf.len(), |l| l.min(buf.len()));
            rng.fill_bytes(&mut buf[..n]);
            if let Err(e) = out.write_all(&buf[..n]) {
                return Err(fail(e).with_written(out.counted));
            }
            left -= n as u64;
        }
        let written = out.counted;
        let partial = |e: io::Error| fail(e).with_written(written);
        out.into_inner().commit().map_err(partial)?;

        let digest = hex::encode(hasher.finalize());
        let mut record = store.create(&layout::checksum_name(index)).map_err(partial)?;
        writeln!(record, "{digest}").map_err(partial)?;
        record.commit().map_err(partial)?;

        Ok(ChunkFile {
            index,
            size_bytes: written,
            digest,
        })
    }
}
