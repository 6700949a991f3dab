#[cfg(test)]
mod chunk_tests;

pub mod digest;
pub mod verifier;
pub mod writer;

/// IO_BLOCK bounds how much of a chunk is held in memory at once.
pub const IO_BLOCK: usize = 1 << 20;

/// A chunk that was written completely, together with its recorded digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkFile {
    pub index: u64,
    pub size_bytes: u64,
    pub digest: String,
}
