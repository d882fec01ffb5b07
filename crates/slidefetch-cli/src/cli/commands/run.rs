//! The download run: Ctrl-C handling, progress lines and the final report.

use std::io::{self, Write};

use anyhow::{Context, Result};
use slidefetch_core::report;
use slidefetch_core::task::TaskState;
use slidefetch_core::{CancelToken, Driver, RunConfig, RunEvent, RunOutcome};

/// Runs the driver on a blocking thread and returns the process exit code.
///
/// The first Ctrl-C stops new downloads and interrupts running ones; their
/// partial data stays in staging for the next run.
pub async fn run_downloads(config: RunConfig) -> Result<i32> {
    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; stopping downloads (partial files are kept for resume)");
            on_signal.cancel();
        }
    });

    let result = tokio::task::spawn_blocking(move || {
        Driver::new(config).run(&cancel, &mut print_event)
    })
    .await
    .context("download driver panicked")?;
    signal_task.abort();

    match result {
        Ok(outcome) => {
            let stdout = io::stdout();
            render(&mut stdout.lock(), &outcome).context("write report")?;
            Ok(outcome.exit_code())
        }
        Err(err) => {
            tracing::error!("run aborted: {}", err);
            eprintln!("slidefetch: {}", err);
            Ok(err.exit_code())
        }
    }
}

fn print_event(event: RunEvent<'_>) {
    match event {
        RunEvent::Started {
            total,
            strategy,
            concurrency,
        } => println!(
            "Downloading {} file(s) with {}, {} at a time",
            total, strategy, concurrency
        ),
        RunEvent::TaskFinished { task, finished, total } => match task.state {
            TaskState::Complete => println!("[{}/{}] Downloaded: {}", finished, total, task.display_name()),
            TaskState::Failed => println!(
                "[{}/{}] Failed: {} ({})",
                finished,
                total,
                task.url,
                task.failure.as_deref().unwrap_or("unknown error")
            ),
            TaskState::Skipped => println!(
                "[{}/{}] Skipped (already present): {}",
                finished,
                total,
                task.display_name()
            ),
            TaskState::Pending | TaskState::InProgress => {}
        },
    }
}

fn render(out: &mut impl Write, outcome: &RunOutcome) -> io::Result<()> {
    match outcome {
        RunOutcome::DryRun { plan, strategy } => report::write_dry_run(out, plan, *strategy),
        RunOutcome::LimitReached { existing, max_files } => writeln!(
            out,
            "Target directory already holds {} file(s) (limit {}); nothing to do.",
            existing, max_files
        ),
        RunOutcome::NothingToDo { already_present } => writeln!(
            out,
            "Nothing to do: {} URL(s) already present.",
            already_present
        ),
        RunOutcome::Finished(summary) => report::write_summary(out, summary),
    }
}
