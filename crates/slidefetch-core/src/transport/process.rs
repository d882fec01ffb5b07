//! Running an external downloader to completion.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::error::FetchError;
use crate::cancel::CancelToken;

/// How often a running downloader is checked for exit, timeout and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runs `executable` with `args`, appending its stdout and stderr to
/// `log_path`. `program` names the downloader in errors and logs.
///
/// Kills the process when `timeout` elapses or `cancel` fires.
pub(super) fn run_logged(
    program: &'static str,
    executable: &Path,
    args: &[OsString],
    log_path: &Path,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<(), FetchError> {
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let log = File::options().create(true).append(true).open(log_path)?;
    let log_err = log.try_clone()?;

    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(log)
        .stderr(log_err)
        .spawn()
        .map_err(|source| FetchError::Process { program, source })?;
    tracing::debug!(
        program,
        executable = %executable.display(),
        pid = child.id(),
        log = %log_path.display(),
        "spawned downloader"
    );

    let started = Instant::now();
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|source| FetchError::Process { program, source })?
        {
            if status.success() {
                return Ok(());
            }
            return Err(FetchError::ExitStatus {
                program,
                code: status.code(),
            });
        }
        if cancel.is_cancelled() {
            stop(program, &mut child);
            return Err(FetchError::Cancelled);
        }
        if started.elapsed() >= timeout {
            stop(program, &mut child);
            return Err(FetchError::Timeout(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn stop(program: &str, child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::debug!(program, "kill failed: {}", e);
    }
    // Reap so no zombie outlives the task.
    let _ = child.wait();
}

/// Writes an executable `sh` script standing in for a downloader.
#[cfg(all(test, unix))]
pub(super) fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
