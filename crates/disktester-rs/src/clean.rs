use std::io;

use tracing::{debug, warn};

use crate::layout;
use crate::store::ChunkStore;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<String>,
    /// Files that could not be removed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl CleanReport {
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Removes every chunk data and checksum file from `store`. Files that do not
/// follow the chunk naming scheme are left alone. Running it twice is safe.
///
/// # Errors
/// Returns an error only if the store cannot be listed; individual removal
/// failures are collected in the report.
pub fn clean(store: &dyn ChunkStore) -> io::Result<CleanReport> {
    let mut names: Vec<String> = store
        .list()?
        .into_iter()
        .filter(|name| layout::is_chunk_file(name))
        .collect();
    names.sort();

    let mut report = CleanReport::default();
    for name in names {
        match store.remove(&name) {
            Ok(()) => {
                debug!(file = %name, "removed");
                report.removed.push(name);
            }
            // Already gone.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(file = %name, error = %e, "remove failed");
                report.failed.push((name, e.to_string()));
            }
        }
    }
    Ok(report)
}
