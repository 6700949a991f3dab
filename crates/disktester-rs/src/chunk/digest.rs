use std::io::{self, Read, Write};

use sha2::{Digest, Sha256};

/// DIGEST_HEX_LEN is the length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Forwards writes to `inner` while feeding the same bytes to `hasher`.
pub struct HashingWriter<'a, W: Write> {
    inner: W,
    hasher: &'a mut Sha256,
    pub counted: u64,
}

impl<'a, W: Write> HashingWriter<'a, W> {
    pub fn new(inner: W, hasher: &'a mut Sha256) -> Self {
        Self {
            inner,
            hasher,
            counted: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Only hash what the inner writer accepted.
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.counted += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Hashes `reader` to EOF, returning the lowercase hex digest and the byte
/// count.
///
/// # Errors
/// Returns an error if reading fails.
pub fn hash_reader<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut total = 0u64;
    loop {
        let n = match reader.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), total))
}

/// Validates the contents of a checksum file and returns the digest.
///
/// # Errors
/// Returns `InvalidData` if the record is not exactly one hex digest.
pub fn parse_record(text: &str) -> io::Result<String> {
    let digest = text.trim();
    if digest.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "checksum record is empty"));
    }
    if digest.len() != DIGEST_HEX_LEN || hex::decode(digest).is_err() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("checksum record is not a sha256 digest: {digest:?}"),
        ));
    }
    Ok(digest.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn hashing_writer_matches_direct_hash() {
        let mut hasher = Sha256::new();
        let mut out = Vec::new();
        {
            let mut w = HashingWriter::new(&mut out, &mut hasher);
            w.write_all(b"ab").unwrap();
            w.write_all(b"c").unwrap();
            assert_eq!(w.counted, 3);
        }
        assert_eq!(out, b"abc");
        assert_eq!(hex::encode(hasher.finalize()), ABC_SHA256);
    }

    #[test]
    fn hash_reader_handles_empty_input() {
        let mut buf = [0u8; 8];
        let (digest, n) = hash_reader(&mut &b""[..], &mut buf).unwrap();
        assert_eq!(digest, EMPTY_SHA256);
        assert_eq!(n, 0);
    }

    #[test]
    fn hash_reader_uses_small_buffers() {
        let mut buf = [0u8; 1];
        let (digest, n) = hash_reader(&mut &b"abc"[..], &mut buf).unwrap();
        assert_eq!(digest, ABC_SHA256);
        assert_eq!(n, 3);
    }

    #[test]
    fn parse_record_trims_and_lowercases() {
        let upper = format!("  {}\n", ABC_SHA256.to_ascii_uppercase());
        assert_eq!(parse_record(&upper).unwrap(), ABC_SHA256);
    }

    #[test]
    fn parse_record_rejects_bad_records() {
        let non_hex = format!("{}zz", &ABC_SHA256[..62]);
        for text in ["", "\n", "abc", &ABC_SHA256[..40], non_hex.as_str()] {
            let err = parse_record(text).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidData, "{text:?}");
        }
    }
}
