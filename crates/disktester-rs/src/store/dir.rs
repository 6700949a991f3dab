use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::{ChunkSink, ChunkStore, check_name};

const WRITE_BUFFER: usize = 1 << 20;

/// Files a desktop leaves behind that do not count against an empty directory.
const IGNORED_ENTRIES: [&str; 2] = [".DS_Store", "Thumbs.db"];

/// Chunk store backed by one directory on the filesystem under test.
pub struct DirStore {
    root: PathBuf,
    /// Evict written and opened files from the page cache so reads hit the
    /// device rather than memory.
    drop_cache: bool,
}

impl DirStore {
    /// # Errors
    /// Returns an error if `root` does not exist or is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if !fs::metadata(&root)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self {
            root,
            drop_cache: true,
        })
    }

    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn create_dir_all(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Self::open(root)
    }

    #[must_use]
    pub const fn with_drop_cache(mut self, drop_cache: bool) -> Self {
        self.drop_cache = drop_cache;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Removes the directory itself when nothing but desktop metadata files
    /// are left in it.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read or removed.
    pub fn remove_dir_if_empty(&self) -> io::Result<bool> {
        let mut litter = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            if !IGNORED_ENTRIES.iter().any(|ignored| name == *ignored) {
                return Ok(false);
            }
            litter.push(entry.path());
        }
        for path in litter {
            fs::remove_file(path)?;
        }
        fs::remove_dir(&self.root)?;
        Ok(true)
    }

    fn join(&self, name: &str) -> io::Result<PathBuf> {
        check_name(name)?;
        Ok(self.root.join(name))
    }
}

struct FileSink {
    inner: BufWriter<File>,
    drop_cache: bool,
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl ChunkSink for FileSink {
    fn commit(self: Box<Self>) -> io::Result<()> {
        let drop_cache = self.drop_cache;
        let file = self.inner.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()?;
        if drop_cache {
            evict_page_cache(&file);
        }
        Ok(())
    }
}

impl ChunkStore for DirStore {
    fn create(&self, name: &str) -> io::Result<Box<dyn ChunkSink + '_>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.join(name)?)?;
        Ok(Box::new(FileSink {
            inner: BufWriter::with_capacity(WRITE_BUFFER, file),
            drop_cache: self.drop_cache,
        }))
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send + '_>> {
        let file = File::open(self.join(name)?)?;
        if self.drop_cache {
            evict_page_cache(&file);
        }
        Ok(Box::new(file))
    }

    fn file_len(&self, name: &str) -> io::Result<u64> {
        Ok(fs::metadata(self.join(name)?)?.len())
    }

    fn list(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.join(name)?)
    }
}

#[cfg(target_os = "linux")]
fn evict_page_cache(file: &File) {
    use std::os::fd::AsRawFd;
    // Advisory only; a refusal leaves cached pages in place.
    let _ = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_DONTNEED) };
}

#[cfg(not(target_os = "linux"))]
fn evict_page_cache(_file: &File) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(store: &DirStore, name: &str, data: &[u8]) {
        let mut sink = store.create(name).expect("create");
        sink.write_all(data).expect("write");
        sink.commit().expect("commit");
    }

    #[test]
    fn create_open_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        write(&store, "a.bin", b"payload");

        let mut back = Vec::new();
        store.open("a.bin").unwrap().read_to_end(&mut back).unwrap();
        assert_eq!(back, b"payload");
        assert_eq!(store.file_len("a.bin").unwrap(), 7);
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        write(&store, "a.bin", b"longer payload");
        write(&store, "a.bin", b"short");

        assert_eq!(store.file_len("a.bin").unwrap(), 5);
    }

    #[test]
    fn list_skips_directories() {
        let dir = TempDir::new().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        write(&store, "file.dat", b"x");
        fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["file.dat".to_string()]);
    }

    #[test]
    fn open_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let err = DirStore::open(&missing).err().expect("must fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn open_rejects_file_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        let err = DirStore::open(&file).err().expect("must fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn names_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        let err = store.create("../escape").err().expect("must fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn remove_dir_if_empty_only_removes_empty_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("work");
        let store = DirStore::create_dir_all(&root).unwrap();
        write(&store, "keep.txt", b"x");

        assert!(!store.remove_dir_if_empty().unwrap());
        store.remove("keep.txt").unwrap();
        assert!(store.remove_dir_if_empty().unwrap());
        assert!(!root.exists());
    }

    #[test]
    fn desktop_metadata_does_not_keep_dir_alive() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("work");
        let store = DirStore::create_dir_all(&root).unwrap();
        fs::write(root.join(".DS_Store"), b"x").unwrap();
        fs::write(root.join("Thumbs.db"), b"y").unwrap();

        assert!(store.remove_dir_if_empty().unwrap());
        assert!(!root.exists());
    }
}
