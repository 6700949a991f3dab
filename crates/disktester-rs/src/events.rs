//! Per-run event hooks. The observer travels in the run context; there is no
//! process-wide sink.

use crate::runner::RunState;
use crate::runner::result::Phase;

#[derive(Clone, Debug, PartialEq)]
pub struct ChunkEvent {
    pub index: u64,
    pub phase: Phase,
    pub bytes: u64,
    pub latency_seconds: f64,
    pub error: bool,
}

/// Receives progress from a running [`crate::TestRunner`]. Chunk events may
/// arrive from several worker threads at once.
pub trait RunObserver: Send + Sync {
    fn state_changed(&self, _state: RunState) {}

    /// `bytes` is the planned or discovered total for the pass.
    fn phase_started(&self, _phase: Phase, _chunks: usize, _bytes: u64) {}

    fn chunk_finished(&self, _event: &ChunkEvent) {}

    fn phase_finished(&self, _phase: Phase) {}
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}
