use std::fmt::Write;

use disktester_rs::{ChunkStatus, CleanReport, RunReport, RunResult, layout};
use indicatif::DecimalBytes;

pub const EXIT_PASS: u8 = 0;
pub const EXIT_FAIL: u8 = 1;
pub const EXIT_ERROR: u8 = 2;

#[must_use]
pub fn exit_status(report: &RunReport) -> u8 {
    if report.passed() { EXIT_PASS } else { EXIT_FAIL }
}

/// Human-readable summary printed at the end of a run.
#[must_use]
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();
    match report {
        RunReport::Clean(clean) => render_clean(&mut out, clean),
        _ => {
            for result in report.results() {
                render_result(&mut out, result);
            }
        }
    }
    let verdict = if report.passed() { "PASS" } else { "FAIL" };
    let _ = writeln!(out, "result: {verdict}");
    out
}

fn render_result(out: &mut String, result: &RunResult) {
    let _ = writeln!(
        out,
        "{}: {} chunks, {}, {} failed",
        result.phase(),
        result.chunks(),
        DecimalBytes(result.total_bytes()),
        result.failure_count()
    );
    for failed in result.failures() {
        let name = layout::data_name(failed.index);
        match &failed.status {
            ChunkStatus::Mismatch { expected, actual } => {
                let _ = writeln!(out, "  {name}: MISMATCH expected {expected}, got {actual}");
            }
            ChunkStatus::IoError { kind, cause } => {
                let _ = writeln!(out, "  {name}: IO_ERROR ({kind:?}) {cause}");
            }
            ChunkStatus::Ok => {}
        }
    }
    if result.chunks() == 0 && !result.interrupted() {
        let _ = writeln!(out, "  no chunks found");
    }
    if result.interrupted() {
        let _ = writeln!(out, "  interrupted before all chunks were processed");
    }
}

fn render_clean(out: &mut String, clean: &CleanReport) {
    let _ = writeln!(out, "clean: removed {} files", clean.removed_count());
    for (name, cause) in &clean.failed {
        let _ = writeln!(out, "  {name}: {cause}");
    }
}
