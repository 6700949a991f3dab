//! Chunked write/verify engine used to survey a storage device for silent
//! corruption and capacity misreporting.
#![allow(clippy::cargo_common_metadata)]

pub mod chunk;
pub mod clean;
pub mod error;
pub mod events;
pub mod layout;
pub mod plan;
pub mod runner;
pub mod space;
pub mod store;

pub use chunk::{ChunkFile, verifier::ChunkVerifier, writer::ChunkWriter};
pub use clean::{CleanReport, clean};
pub use error::{ChunkError, PlanError, RunError};
pub use events::{ChunkEvent, NoopObserver, RunObserver};
pub use plan::{ChunkDescriptor, ChunkPlan, PlanParams, TotalSize, plan};
pub use runner::result::{ChunkOutcome, ChunkStatus, Phase, RunReport, RunResult};
pub use runner::{CancelToken, RunContext, RunMode, RunSettings, RunState, TestRunner};
pub use space::SpaceProbe;
pub use store::{ChunkSink, ChunkStore, dir::DirStore, memory::MemStore};
