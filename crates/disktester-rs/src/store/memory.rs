
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{ChunkSink, ChunkStore, check_name};
use crate::space::SpaceProbe;

#[derive(Debug, Default)]
struct MemState {
    files: HashMap<String, Vec<u8>>,
    capacity: Option<u64>,
}

impl MemState {
    fn used(&self) -> u64 {
        self.files.values().map(|f| f.len() as u64).sum()
    }
}

/// In-memory chunk store. Writes land immediately, like a real directory,
/// so an aborted chunk leaves its partial bytes behind. An optional capacity
/// makes writes fail with `StorageFull` once exhausted.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    state: Arc<Mutex<MemState>>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        let store = Self::default();
        store.lock().capacity = Some(capacity);
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put(&self, name: &str, data: &[u8]) {
        self.lock().files.insert(name.to_string(), data.to_vec());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().files.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lock().files.contains_key(name)
    }

    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.lock().used()
    }

    /// Flips every bit of the byte at `offset`. Returns false if the file or
    /// offset does not exist.
    pub fn corrupt(&self, name: &str, offset: usize) -> bool {
        let mut state = self.lock();
        match state.files.get_mut(name).and_then(|f| f.get_mut(offset)) {
            Some(byte) => {
                *byte ^= 0xFF;
                true
            }
            None => false,
        }
    }

    /// Shortens `name` to `len` bytes. Returns false if the file is missing.
    pub fn truncate(&self, name: &str, len: usize) -> bool {
        let mut state = self.lock();
        match state.files.get_mut(name) {
            Some(f) => {
                f.truncate(len);
                true
            }
            None => false,
        }
    }
}

struct MemSink {
    state: Arc<Mutex<MemState>>,
    name: String,
}

impl Write for MemSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let room = state
            .capacity
            .map_or(u64::MAX, |cap| cap.saturating_sub(state.used()));
        if room == 0 && !buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "store is full"));
        }
        let n = usize::try_from(room).map_or(buf.len(), |room| buf.len().min(room));
        state
            .files
            .entry(self.name.clone())
            .or_default()
            .extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ChunkSink for MemSink {
    fn commit(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl ChunkStore for MemStore {
    fn create(&self, name: &str) -> io::Result<Box<dyn ChunkSink + '_>> {
        check_name(name)?;
        self.lock().files.insert(name.to_string(), Vec::new());
        Ok(Box::new(MemSink {
            state: Arc::clone(&self.state),
            name: name.to_string(),
        }))
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send + '_>> {
        check_name(name)?;
        let data = self
            .get(name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{name} not found")))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn file_len(&self, name: &str) -> io::Result<u64> {
        check_name(name)?;
        self.lock()
            .files
            .get(name)
            .map(|f| f.len() as u64)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{name} not found")))
    }

    fn list(&self) -> io::Result<Vec<String>> {
        Ok(self.lock().files.keys().cloned().collect())
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        check_name(name)?;
        self.lock()
            .files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{name} not found")))
    }
}

impl SpaceProbe for MemStore {
    fn available_bytes(&self) -> io::Result<u64> {
        let state = self.lock();
        Ok(state
            .capacity
            .map_or(u64::MAX, |cap| cap.saturating_sub(state.used())))
    }
}
