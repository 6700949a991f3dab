use std::fmt;
use std::io;

use crate::clean::CleanReport;
use crate::error::ChunkError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Write,
    Verify,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => f.write_str("write"),
            Self::Verify => f.write_str("verify"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkStatus {
    Ok,
    /// The data file was read in full but hashes to something else.
    Mismatch { expected: String, actual: String },
    /// A file was missing, unreadable, truncated or malformed.
    IoError { kind: io::ErrorKind, cause: String },
}

impl ChunkStatus {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Mismatch { .. } => "MISMATCH",
            Self::IoError { .. } => "IO_ERROR",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub index: u64,
    /// Bytes written or verified for this chunk.
    pub bytes: u64,
    pub status: ChunkStatus,
}

impl ChunkOutcome {
    #[must_use]
    pub const fn ok(index: u64, bytes: u64) -> Self {
        Self {
            index,
            bytes,
            status: ChunkStatus::Ok,
        }
    }

    #[must_use]
    pub fn io_error(index: u64, bytes: u64, err: &io::Error) -> Self {
        Self {
            index,
            bytes,
            status: ChunkStatus::IoError {
                kind: err.kind(),
                cause: err.to_string(),
            },
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.status.is_ok()
    }
}

impl From<ChunkError> for ChunkOutcome {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::Io {
                index,
                written,
                source,
            } => Self::io_error(index, written, &source),
        }
    }
}

/// Outcome of one write or verify pass, ordered by chunk index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    phase: Phase,
    outcomes: Vec<ChunkOutcome>,
    interrupted: bool,
}

impl RunResult {
    #[must_use]
    pub fn new(phase: Phase, mut outcomes: Vec<ChunkOutcome>, interrupted: bool) -> Self {
        outcomes.sort_by_key(|o| o.index);
        Self {
            phase,
            outcomes,
            interrupted,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn outcomes(&self) -> &[ChunkOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub const fn interrupted(&self) -> bool {
        self.interrupted
    }

    #[must_use]
    pub fn chunks(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.outcomes.iter().map(|o| o.bytes).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ChunkOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Passing needs at least one chunk, no failures and a pass that ran to
    /// the end.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.outcomes.is_empty() && !self.interrupted && self.failure_count() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunReport {
    Test {
        write: RunResult,
        verify: Option<RunResult>,
    },
    Validate(RunResult),
    Clean(CleanReport),
}

impl RunReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        match self {
            Self::Test { write, verify } => write.passed() && verify.as_ref().is_none_or(RunResult::passed),
            Self::Validate(result) => result.passed(),
            Self::Clean(report) => report.failed.is_empty(),
        }
    }

    /// The chunk passes in the order they ran.
    #[must_use]
    pub fn results(&self) -> Vec<&RunResult> {
        match self {
            Self::Test { write, verify } => std::iter::once(write).chain(verify.as_ref()).collect(),
            Self::Validate(result) => vec![result],
            Self::Clean(_) => Vec::new(),
        }
    }
}
