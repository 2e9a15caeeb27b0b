//! Test result reporter: formats PASS/FAIL output and prints a summary.

use std::fmt::Write;

use beer_consumer::{ScenarioOutcome, SuiteReport, SuiteStatus};

use crate::fixture::Fixture;

/// Render `report` for `fixtures`, which must be in the order they ran.
pub fn render(fixtures: &[Fixture], report: &SuiteReport) -> String {
    let mut out = String::new();

    match &report.status {
        SuiteStatus::Skipped(reason) => {
            let _ = writeln!(out, "SKIP  {reason}");
            return out;
        }
        SuiteStatus::Aborted(reason) => {
            let _ = writeln!(out, "ABORT {reason}");
        }
        SuiteStatus::Completed => {}
    }

    for (fixture, result) in fixtures.iter().zip(&report.scenarios) {
        let label = format!("[{}/{}] {}", fixture.service, fixture.id, fixture.description);
        let _ = match &result.outcome {
            ScenarioOutcome::Passed => writeln!(out, "PASS  {label}"),
            ScenarioOutcome::Failed { expected, actual } => writeln!(
                out,
                "FAIL  {label}\n        check(age = {}) → expected {expected}, got {actual}",
                fixture.request.age
            ),
            ScenarioOutcome::Errored(error) => {
                writeln!(out, "ERROR {label}\n        error: {error}")
            }
        };
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "────────────────────────────────────────────────────");
    let _ = writeln!(
        out,
        "Results: {} passed, {} failed",
        report.passed(),
        report.failed()
    );
    out
}
