//! Text rendering of dry-run plans and end-of-run summaries.

use std::io::{self, Write};

use crate::driver::RunSummary;
use crate::filter::Plan;
use crate::task::TaskState;
use crate::transport::Strategy;

/// Prints what a real run would do. Already-present URLs come first.
pub fn write_dry_run(out: &mut impl Write, plan: &Plan, strategy: Strategy) -> io::Result<()> {
    writeln!(out, "Dry run: nothing will be downloaded.")?;
    writeln!(out, "Target directory: {}", plan.target_dir.display())?;
    writeln!(out, "Transport: {}", strategy)?;
    for skip in &plan.skipped {
        writeln!(out, "already present: {} ({})", skip.entry.url, skip.existing)?;
    }
    for dup in &plan.duplicates {
        writeln!(out, "same file as an earlier URL: {} ({})", dup.entry.url, dup.existing)?;
    }
    for task in &plan.pending {
        writeln!(out, "would download: {} -> {}", task.url, task.destination.display())?;
    }
    if plan.is_empty() {
        writeln!(out, "Nothing to download.")?;
    } else {
        writeln!(
            out,
            "{} to download, {} already present.",
            plan.pending.len(),
            plan.skipped_count()
        )?;
    }
    Ok(())
}

/// Prints the counts of a finished run and the reason for each failure.
pub fn write_summary(out: &mut impl Write, summary: &RunSummary) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Summary")?;
    writeln!(out, "  Total attempted:          {}", summary.attempted())?;
    writeln!(out, "  Successful:               {}", summary.completed())?;
    writeln!(out, "  Failed:                   {}", summary.failed())?;
    writeln!(
        out,
        "  Skipped (already present): {}",
        summary.already_present + summary.skipped_on_publish()
    )?;
    if summary.duplicates > 0 {
        writeln!(out, "  Skipped (duplicate name):  {}", summary.duplicates)?;
    }
    if summary.not_started() > 0 {
        writeln!(out, "  Not started:              {}", summary.not_started())?;
    }
    let failures: Vec<_> = summary
        .tasks
        .iter()
        .filter(|t| t.state == TaskState::Failed)
        .collect();
    if !failures.is_empty() {
        writeln!(out, "Failed downloads:")?;
        for task in failures {
            writeln!(
                out,
                "  {} ({})",
                task.url,
                task.failure.as_deref().unwrap_or("unknown error")
            )?;
        }
    }
    if summary.cancelled {
        writeln!(out, "Interrupted; rerun to resume.")?;
    }
    Ok(())
}
