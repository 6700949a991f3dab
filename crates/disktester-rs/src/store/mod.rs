//! Flat file namespace the engine writes chunks into.

pub mod dir;
pub mod memory;

use std::io::{self, Read, Write};

/// A file being written. Bytes are only durable once [`ChunkSink::commit`]
/// returns.
pub trait ChunkSink: Write + Send {
    /// # Errors
    /// Returns an error if buffered bytes cannot be flushed or synced.
    fn commit(self: Box<Self>) -> io::Result<()>;
}

pub trait ChunkStore: Send + Sync {
    /// Creates or truncates `name`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    fn create(&self, name: &str) -> io::Result<Box<dyn ChunkSink + '_>>;

    /// # Errors
    /// Returns an error if `name` is missing or unreadable.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send + '_>>;

    /// # Errors
    /// Returns an error if `name` is missing.
    fn file_len(&self, name: &str) -> io::Result<u64>;

    /// Names of regular files, in no particular order.
    ///
    /// # Errors
    /// Returns an error if the namespace cannot be listed.
    fn list(&self) -> io::Result<Vec<String>>;

    /// # Errors
    /// Returns an error if `name` cannot be removed.
    fn remove(&self, name: &str) -> io::Result<()>;
}

/// Rejects names that would escape the namespace.
pub(crate) fn check_name(name: &str) -> io::Result<()> {
    if name.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsafe name: {name}"),
        ));
    }
    Ok(())
}
