use std::path::PathBuf;

use anyhow::{Context, ensure};
use clap::{Args, Parser, Subcommand};
use disktester_rs::plan::DEFAULT_MIN_TAIL;
use disktester_rs::runner::DEFAULT_CHUNK_SIZE;
use disktester_rs::{RunSettings, TotalSize};

pub const GB: u64 = 1_000_000_000;
pub const MB: u64 = 1_000_000;

pub const DEFAULT_SUBDIR: &str = "disktester";

#[derive(Parser, Debug)]
#[command(
    name = "disktester",
    author,
    version,
    about = "Writes random data to a disk in checksummed chunks and validates it"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write chunks, then verify them.
    Test(TestArgs),

    /// Re-check every chunk already on the disk.
    Validate(CommonArgs),

    /// Remove every chunk, and the work directory if it ends up empty.
    Clean(CommonArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Mount point or folder of the disk under test.
    #[arg(short, long, env = "DISKTESTER_FOLDER")]
    pub folder: PathBuf,

    /// Directory created under the folder to hold the chunks.
    #[arg(long, env = "DISKTESTER_SUBDIR", default_value = DEFAULT_SUBDIR)]
    pub subdir: String,

    #[arg(long, env = "DISKTESTER_WORKERS", default_value_t = 1)]
    pub workers: usize,

    /// Hide progress bars.
    #[arg(short, long, env = "DISKTESTER_QUIET")]
    pub quiet: bool,
}

impl CommonArgs {
    #[must_use]
    pub fn work_dir(&self) -> PathBuf {
        self.folder.join(&self.subdir)
    }

    /// # Errors
    /// Returns an error if the worker count is zero.
    pub fn settings(&self) -> anyhow::Result<RunSettings> {
        ensure!(self.workers > 0, "--workers must be at least 1");
        Ok(RunSettings {
            workers: self.workers,
            ..RunSettings::default()
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Data to write in GB (10^9 bytes). Fills the free space when omitted.
    #[arg(short, long, env = "DISKTESTER_SIZE_GB")]
    pub size: Option<u64>,

    /// Size of each chunk file in MB (10^6 bytes).
    #[arg(short, long, env = "DISKTESTER_CHUNK_SIZE_MB", default_value_t = DEFAULT_CHUNK_SIZE / MB)]
    pub chunk_size: u64,

    /// Smallest trailing chunk worth writing, in MB.
    #[arg(long, env = "DISKTESTER_MIN_TAIL_MB", default_value_t = DEFAULT_MIN_TAIL / MB)]
    pub min_tail: u64,

    /// Skip the verify pass after writing.
    #[arg(long, env = "DISKTESTER_NO_VERIFY")]
    pub no_verify: bool,
}

impl TestArgs {
    /// # Errors
    /// Returns an error if a size overflows when converted to bytes, or the
    /// worker count is zero.
    pub fn settings(&self) -> anyhow::Result<RunSettings> {
        let total = match self.size {
            Some(gb) => TotalSize::Bytes(gb.checked_mul(GB).context("--size is too large")?),
            None => TotalSize::FillAvailable,
        };
        Ok(RunSettings {
            total,
            chunk_size: self
                .chunk_size
                .checked_mul(MB)
                .context("--chunk-size is too large")?,
            min_tail: self
                .min_tail
                .checked_mul(MB)
                .context("--min-tail is too large")?,
            ..self.common.settings()?
        })
    }
}
