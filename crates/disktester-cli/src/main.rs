mod cli;
mod progress;
mod report;
mod signal;
mod space;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use disktester_rs::{CancelToken, DirStore, RunContext, RunMode, RunReport, RunSettings, TestRunner};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, CommonArgs, TestArgs};
use crate::space::StatvfsProbe;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(report::EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let cancel = CancelToken::new();
    signal::install(cancel.clone()).context("installing signal handlers")?;

    match cli.command {
        Command::Test(args) => cmd_test(&args, cancel),
        Command::Validate(args) => cmd_validate(&args, cancel),
        Command::Clean(args) => cmd_clean(&args),
    }
}

fn cmd_test(args: &TestArgs, cancel: CancelToken) -> anyhow::Result<u8> {
    let settings = args.settings()?;
    let work_dir = args.common.work_dir();
    let store = DirStore::create_dir_all(&work_dir)
        .with_context(|| format!("creating {}", work_dir.display()))?;
    let probe = StatvfsProbe::new(&work_dir);

    info!(
        dir = %work_dir.display(),
        total = ?settings.total,
        chunk_size = settings.chunk_size,
        workers = settings.workers,
        "testing disk"
    );
    let mode = RunMode::Write {
        verify_after: !args.no_verify,
    };
    execute(&store, &probe, settings, mode, &args.common, cancel)
}

fn cmd_validate(args: &CommonArgs, cancel: CancelToken) -> anyhow::Result<u8> {
    let settings = args.settings()?;
    let work_dir = args.work_dir();
    let store =
        DirStore::open(&work_dir).with_context(|| format!("opening {}", work_dir.display()))?;
    let probe = StatvfsProbe::new(&work_dir);

    info!(dir = %work_dir.display(), workers = settings.workers, "validating");
    execute(&store, &probe, settings, RunMode::Verify, args, cancel)
}

fn cmd_clean(args: &CommonArgs) -> anyhow::Result<u8> {
    let work_dir = args.work_dir();
    if !work_dir.exists() {
        info!(dir = %work_dir.display(), "does not exist, nothing to clean");
        return Ok(report::EXIT_PASS);
    }
    let store =
        DirStore::open(&work_dir).with_context(|| format!("opening {}", work_dir.display()))?;
    let probe = StatvfsProbe::new(&work_dir);

    info!(dir = %work_dir.display(), "cleaning");
    let code = execute(
        &store,
        &probe,
        RunSettings::default(),
        RunMode::Clean,
        args,
        CancelToken::new(),
    )?;

    if store
        .remove_dir_if_empty()
        .with_context(|| format!("removing {}", work_dir.display()))?
    {
        info!(dir = %work_dir.display(), "empty, removed");
    } else {
        warn!(dir = %work_dir.display(), "not empty, kept");
    }
    Ok(code)
}

fn execute(
    store: &DirStore,
    probe: &StatvfsProbe,
    settings: RunSettings,
    mode: RunMode,
    common: &CommonArgs,
    cancel: CancelToken,
) -> anyhow::Result<u8> {
    let observer = progress::observer(common.quiet);
    let ctx = RunContext::new(store, probe, settings)
        .with_cancel(cancel)
        .with_observer(observer.as_ref());
    let report: RunReport = TestRunner::new(ctx).run(mode)?;

    print!("{}", report::render(&report));
    Ok(report::exit_status(&report))
}
