use std::sync::{Mutex, PoisonError};

use disktester_rs::Phase;
use disktester_rs::events::{ChunkEvent, NoopObserver, RunObserver};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{spinner:.green} {msg:<8} [{elapsed_precise}] [{bar:40.white}] {bytes}/{total_bytes} ({binary_bytes_per_sec}, ETA {eta})";

/// One bar per pass, sized in bytes.
#[derive(Default)]
pub struct ProgressObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver {
    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut bar);
    }
}

impl RunObserver for ProgressObserver {
    fn phase_started(&self, phase: Phase, _chunks: usize, bytes: u64) {
        let bar = ProgressBar::new(bytes);
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█░░"),
        );
        bar.set_message(phase.to_string());
        self.with_bar(|slot| *slot = Some(bar));
    }

    fn chunk_finished(&self, event: &ChunkEvent) {
        self.with_bar(|slot| {
            if let Some(bar) = slot {
                bar.inc(event.bytes);
            }
        });
    }

    fn phase_finished(&self, _phase: Phase) {
        self.with_bar(|slot| {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        });
    }
}

#[must_use]
pub fn observer(quiet: bool) -> Box<dyn RunObserver> {
    if quiet {
        Box::new(NoopObserver)
    } else {
        Box::new(ProgressObserver::default())
    }
}
