//! File naming contract shared by the writer, verifier, validate pass and
//! cleaner.


use std::collections::BTreeMap;

use crate::store::ChunkStore;

/// PREFIX starts every chunk file name.
pub const PREFIX: &str = "chunk_";
/// DATA_EXT is the extension of data files.
pub const DATA_EXT: &str = "dat";
/// CHECKSUM_EXT is the extension of checksum files; it names the digest.
pub const CHECKSUM_EXT: &str = "sha256";
/// INDEX_WIDTH is the zero padding applied to indices.
pub const INDEX_WIDTH: usize = 6;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    Data,
    Checksum,
}

impl FileKind {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Data => DATA_EXT,
            Self::Checksum => CHECKSUM_EXT,
        }
    }
}

#[must_use]
pub fn file_name(index: u64, kind: FileKind) -> String {
    format!(
        "{PREFIX}{index:0width$}.{}",
        kind.extension(),
        width = INDEX_WIDTH
    )
}

#[must_use]
pub fn data_name(index: u64) -> String {
    file_name(index, FileKind::Data)
}

#[must_use]
pub fn checksum_name(index: u64) -> String {
    file_name(index, FileKind::Checksum)
}

/// Parses a name produced by [`file_name`]. Anything that does not format
/// back to exactly the same string is rejected, so unrelated files such as
/// `chunk_7.dat.bak` or `chunk_0001.dat` are never claimed.
#[must_use]
pub fn parse(name: &str) -> Option<(u64, FileKind)> {
    let rest = name.strip_prefix(PREFIX)?;
    let (digits, ext) = rest.split_once('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let kind = match ext {
        DATA_EXT => FileKind::Data,
        CHECKSUM_EXT => FileKind::Checksum,
        _ => return None,
    };
    let index: u64 = digits.parse().ok()?;
    (file_name(index, kind) == name).then_some((index, kind))
}

#[must_use]
pub fn is_chunk_file(name: &str) -> bool {
    parse(name).is_some()
}

/// One index found in the store, with whichever halves of the pair exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPair {
    pub index: u64,
    pub has_data: bool,
    pub has_checksum: bool,
}

impl ChunkPair {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.has_data && self.has_checksum
    }
}

/// Groups the chunk files of `store` by index, ascending.
///
/// # Errors
/// Returns an error if the store cannot be listed.
pub fn discover(store: &dyn ChunkStore) -> std::io::Result<Vec<ChunkPair>> {
    let mut by_index: BTreeMap<u64, ChunkPair> = BTreeMap::new();
    for name in store.list()? {
        let Some((index, kind)) = parse(&name) else {
            continue;
        };
        let pair = by_index.entry(index).or_insert(ChunkPair {
            index,
            has_data: false,
            has_checksum: false,
        });
        match kind {
            FileKind::Data => pair.has_data = true,
            FileKind::Checksum => pair.has_checksum = true,
        }
    }
    Ok(by_index.into_values().collect())
}
