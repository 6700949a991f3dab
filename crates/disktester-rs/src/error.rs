use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("requested total size must be greater than zero")]
    InvalidTotal,

    #[error("insufficient space: {available} bytes available, {margin} bytes reserved")]
    InsufficientSpace { available: u64, margin: u64 },
}

/// Failure to create one chunk. Never fatal to a run.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("chunk {index}: {source} after {written} bytes")]
    Io {
        index: u64,
        /// Data bytes accepted by the store before the failure.
        written: u64,
        #[source]
        source: std::io::Error,
    },
}

impl ChunkError {
    pub fn io(index: u64, source: std::io::Error) -> Self {
        Self::Io {
            index,
            written: 0,
            source,
        }
    }

    #[must_use]
    pub fn with_written(self, written: u64) -> Self {
        match self {
            Self::Io { index, source, .. } => Self::Io {
                index,
                written,
                source,
            },
        }
    }

    #[must_use]
    pub const fn written(&self) -> u64 {
        match self {
            Self::Io { written, .. } => *written,
        }
    }

    #[must_use]
    pub const fn index(&self) -> u64 {
        match self {
            Self::Io { index, .. } => *index,
        }
    }
}

/// The run could not happen at all, as opposed to a run with failed chunks.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("free space query failed: {0}")]
    Space(#[source] std::io::Error),

    #[error("listing chunk files failed: {0}")]
    Listing(#[source] std::io::Error),

    #[error("worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
