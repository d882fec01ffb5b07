//! Logging init: stderr by default, or append to a file given on the command line.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter for the log file when `RUST_LOG` is unset.
const FILE_FILTER: &str = "info,slidefetch_core=debug";

/// Filter for stderr when `RUST_LOG` is unset. Progress goes to stdout, so
/// stderr only carries problems.
const STDERR_FILTER: &str = "warn";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create log directory {}", dir.display()))?;
    }
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Initialize logging. With `log_file`, events are appended there; otherwise
/// they go to stderr.
///
/// Worker threads log concurrently, so every event is written whole under
/// one lock on the file.
///
/// Returns Err when the file cannot be opened or a subscriber is already
/// installed, so the caller can fall back to [`init_stderr`].
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        init_stderr();
        return Ok(());
    };
    let file = open_log_file(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(FILE_FILTER))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialized: {}", e))?;

    tracing::info!("slidefetch logging to {}", path.display());
    Ok(())
}

/// Initialize logging to stderr only. Safe to call when a subscriber is
/// already installed.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(STDERR_FILTER))
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("nested").join("run.log");
        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn log_file_under_a_regular_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let err = init(Some(blocker.join("run.log").as_path())).unwrap_err();
        assert!(format!("{:#}", err).contains("create log directory"));
    }

    /// The only test that installs the global subscriber.
    #[test]
    fn file_logging_appends_and_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        fs::write(&path, "earlier run\n").unwrap();

        init(Some(path.as_path())).unwrap();
        tracing::warn!(file = "GTEX-1", "written through the file writer");
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("earlier run\n"));
        assert!(text.contains("slidefetch logging to"));
        assert!(text.contains("written through the file writer"));

        let again = init(Some(dir.path().join("second.log").as_path())).unwrap_err();
        assert!(again.to_string().contains("logging already initialized"));
    }
}
