
pub mod result;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use self::result::{ChunkOutcome, Phase, RunReport, RunResult};
use crate::chunk::verifier::ChunkVerifier;
use crate::chunk::writer::ChunkWriter;
use crate::clean::clean;
use crate::error::RunError;
use crate::events::{ChunkEvent, NoopObserver, RunObserver};
use crate::layout;
use crate::plan::{self, ChunkDescriptor, DEFAULT_MIN_TAIL, PlanParams, TotalSize};
use crate::space::SpaceProbe;
use crate::store::ChunkStore;

/// DEFAULT_CHUNK_SIZE is 200 MB, decimal.
pub const DEFAULT_CHUNK_SIZE: u64 = 200_000_000;

static NOOP: NoopObserver = NoopObserver;

/// Shared stop flag, checked before each chunk starts.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunSettings {
    pub total: TotalSize,
    pub chunk_size: u64,
    pub min_tail: u64,
    pub workers: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            total: TotalSize::FillAvailable,
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_tail: DEFAULT_MIN_TAIL,
            workers: 1,
        }
    }
}

impl RunSettings {
    #[must_use]
    pub const fn plan_params(&self) -> PlanParams {
        PlanParams::new(self.total, self.chunk_size).with_min_tail(self.min_tail)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    Write { verify_after: bool },
    Verify,
    Clean,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    Init,
    Planning,
    Writing,
    Verifying,
    Cleaning,
    Done,
}

/// Everything a run needs. Nothing here is process-wide.
pub struct RunContext<'a> {
    store: &'a dyn ChunkStore,
    space: &'a dyn SpaceProbe,
    settings: RunSettings,
    rng: StdRng,
    cancel: CancelToken,
    observer: &'a dyn RunObserver,
}

impl<'a> RunContext<'a> {
    pub fn new(store: &'a dyn ChunkStore, space: &'a dyn SpaceProbe, settings: RunSettings) -> Self {
        Self {
            store,
            space,
            settings,
            rng: StdRng::from_os_rng(),
            cancel: CancelToken::new(),
            observer: &NOOP,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn RunObserver) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Makes chunk contents reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &RunSettings {
        &self.settings
    }

    #[must_use]
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// Drives one write, verify or clean run over a store.
pub struct TestRunner<'a> {
    ctx: RunContext<'a>,
    state: RunState,
}

impl<'a> TestRunner<'a> {
    #[must_use]
    pub const fn new(ctx: RunContext<'a>) -> Self {
        Self {
            ctx,
            state: RunState::Init,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Chunk failures land in the report. Only a run that could not start
    /// or could not enumerate its chunks is an error.
    ///
    /// # Errors
    /// See [`RunError`].
    pub fn run(mut self, mode: RunMode) -> Result<RunReport, RunError> {
        debug!(?mode, "run start");
        self.ctx.observer.state_changed(RunState::Init);
        let report = match mode {
            RunMode::Write { verify_after } => self.run_test(verify_after),
            RunMode::Verify => self.run_validate(),
            RunMode::Clean => self.run_clean(),
        };
        self.transition(RunState::Done);
        report
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
        self.ctx.observer.state_changed(next);
    }

    fn run_test(&mut self, verify_after: bool) -> Result<RunReport, RunError> {
        self.transition(RunState::Planning);
        let free = self.ctx.space.available_bytes().map_err(RunError::Space)?;
        let params = self.ctx.settings.plan_params();
        let plan = plan::plan(&params, free)?;

        if let TotalSize::Bytes(requested) = params.total
            && plan.total_bytes() < requested
        {
            warn!(
                requested,
                planned = plan.total_bytes(),
                free,
                "requested size capped by free space"
            );
        }
        info!(
            chunks = plan.len(),
            total_bytes = plan.total_bytes(),
            margin_bytes = plan.margin_bytes(),
            "planned"
        );

        self.transition(RunState::Writing);
        let jobs: Vec<(ChunkDescriptor, u64)> = plan
            .descriptors()
            .iter()
            .map(|d| (*d, self.ctx.rng.next_u64()))
            .collect();
        let write = self.execute(Phase::Write, &jobs, plan.total_bytes(), |store, (d, seed)| {
            match ChunkWriter.write(store, *d, *seed) {
                Ok(file) => ChunkOutcome::ok(file.index, file.size_bytes),
                Err(e) => ChunkOutcome::from(e),
            }
        })?;

        if !verify_after || write.interrupted() {
            return Ok(RunReport::Test {
                write,
                verify: None,
            });
        }

        self.transition(RunState::Verifying);
        let jobs: Vec<(u64, u64)> = write
            .outcomes()
            .iter()
            .filter(|o| !o.is_failure())
            .map(|o| (o.index, o.bytes))
            .collect();
        let bytes: u64 = jobs.iter().map(|(_, len)| len).sum();
        let verify = self.execute(Phase::Verify, &jobs, bytes, |store, &(index, len)| {
            ChunkVerifier.verify(store, index, Some(len))
        })?;

        Ok(RunReport::Test {
            write,
            verify: Some(verify),
        })
    }

    fn run_validate(&mut self) -> Result<RunReport, RunError> {
        self.transition(RunState::Verifying);
        let store = self.ctx.store;
        let pairs = layout::discover(store).map_err(RunError::Listing)?;
        if pairs.is_empty() {
            warn!("no chunk files found");
        }
        for pair in pairs.iter().filter(|p| !p.is_complete()) {
            warn!(
                index = pair.index,
                has_data = pair.has_data,
                has_checksum = pair.has_checksum,
                "incomplete chunk pair"
            );
        }

        let bytes: u64 = pairs
            .iter()
            .filter(|p| p.has_data)
            .filter_map(|p| store.file_len(&layout::data_name(p.index)).ok())
            .sum();
        let jobs: Vec<u64> = pairs.iter().map(|p| p.index).collect();
        let result = self.execute(Phase::Verify, &jobs, bytes, |store, &index| {
            ChunkVerifier.verify(store, index, None)
        })?;
        Ok(RunReport::Validate(result))
    }

    fn run_clean(&mut self) -> Result<RunReport, RunError> {
        self.transition(RunState::Cleaning);
        let report = clean(self.ctx.store).map_err(RunError::Listing)?;
        info!(
            removed = report.removed_count(),
            failed = report.failed.len(),
            "cleaned"
        );
        Ok(RunReport::Clean(report))
    }

    /// Runs `work` once per job, on the calling thread or on a pool of
    /// `workers` threads. Jobs not yet started when the token trips are
    /// skipped and the result is marked interrupted.
    fn execute<J, F>(
        &self,
        phase: Phase,
        jobs: &[J],
        total_bytes: u64,
        work: F,
    ) -> Result<RunResult, RunError>
    where
        J: Sync,
        F: Fn(&dyn ChunkStore, &J) -> ChunkOutcome + Sync,
    {
        let store = self.ctx.store;
        let cancel = &self.ctx.cancel;
        let observer = self.ctx.observer;
        observer.phase_started(phase, jobs.len(), total_bytes);

        let run_one = |job: &J| -> Option<ChunkOutcome> {
            if cancel.is_cancelled() {
                return None;
            }
            let started = Instant::now();
            let outcome = work(store, job);
            let event = ChunkEvent {
                index: outcome.index,
                phase,
                bytes: outcome.bytes,
                latency_seconds: started.elapsed().as_secs_f64(),
                error: outcome.is_failure(),
            };
            if event.error {
                warn!(
                    %phase,
                    index = outcome.index,
                    status = outcome.status.label(),
                    detail = ?outcome.status,
                    "chunk failed"
                );
            } else {
                debug!(%phase, index = outcome.index, bytes = outcome.bytes, "chunk ok");
            }
            observer.chunk_finished(&event);
            Some(outcome)
        };

        let workers = self.ctx.settings.workers;
        let slots: Vec<Option<ChunkOutcome>> = if workers <= 1 {
            jobs.iter().map(run_one).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("disktester-{i}"))
                .build()?;
            pool.install(|| jobs.par_iter().map(run_one).collect())
        };
        observer.phase_finished(phase);

        let interrupted = slots.iter().any(Option::is_none);
        if interrupted {
            warn!(%phase, "run interrupted");
        }
        let outcomes = slots.into_iter().flatten().collect();
        Ok(RunResult::new(phase, outcomes, interrupted))
    }
}
