use std::io;
use std::thread;

use disktester_rs::CancelToken;
use tracing::{info, warn};

/// Exit status after a second interrupt, matching a shell's 128 + SIGINT.
const FORCED_EXIT: i32 = 130;

/// Trips `cancel` on the first Ctrl-C or SIGTERM so the run stops between
/// chunks. A second signal exits at once.
///
/// # Errors
/// Returns an error if the signal runtime or its thread cannot start.
pub fn install(cancel: CancelToken) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("disktester-signal".into())
        .spawn(move || {
            runtime.block_on(async move {
                if !wait_for_shutdown().await {
                    return;
                }
                cancel.cancel();
                info!("finishing chunks in flight, interrupt again to abort");
                if wait_for_shutdown().await {
                    warn!("aborted");
                    std::process::exit(FORCED_EXIT);
                }
            });
        })?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> bool {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable");
            return ctrl_c().await;
        }
    };
    tokio::select! {
        caught = ctrl_c() => caught,
        _ = term.recv() => {
            info!("shutdown: SIGTERM");
            true
        },
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> bool {
    ctrl_c().await
}

async fn ctrl_c() -> bool {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("shutdown: ctrl-c");
            true
        }
        Err(e) => {
            warn!(error = %e, "ctrl-c handler unavailable");
            false
        }
    }
}
