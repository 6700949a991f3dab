use std::io;
use std::path::{Path, PathBuf};

use disktester_rs::SpaceProbe;

/// Free space as seen by an unprivileged user of the filesystem holding
/// `path`.
#[derive(Clone, Debug)]
pub struct StatvfsProbe {
    path: PathBuf,
}

impl StatvfsProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SpaceProbe for StatvfsProbe {
    fn available_bytes(&self) -> io::Result<u64> {
        available_bytes(&self.path)
    }
}

#[cfg(unix)]
#[allow(clippy::useless_conversion)]
pub fn available_bytes(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut stat = std::mem::MaybeUninit::<libc::statvfs>::uninit();
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    let stat = unsafe { stat.assume_init() };
    Ok(u64::from(stat.f_bavail).saturating_mul(u64::from(stat.f_frsize)))
}

#[cfg(not(unix))]
pub fn available_bytes(path: &Path) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("free space query not supported for {}", path.display()),
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reports_space_for_existing_dir() {
        let dir = TempDir::new().expect("tempdir");
        let probe = StatvfsProbe::new(dir.path());
        assert!(probe.available_bytes().expect("statvfs") > 0);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = available_bytes(&dir.path().join("missing")).expect_err("must fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
