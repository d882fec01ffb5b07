//! Single-connection downloads through `wget`.

use std::ffi::OsString;
use std::path::PathBuf;

use super::aria2::staged_result;
use super::process::run_logged;
use super::{FetchContext, FetchError, Staged, Transport, TransportSettings};
use crate::task::DownloadTask;

pub(super) const PROGRAM: &str = "wget";

/// Runs `wget -c` per file. The server's Content-Disposition name is honoured
/// and a partial file in staging is continued.
pub struct WgetTransport {
    settings: TransportSettings,
    executable: PathBuf,
}

impl WgetTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self {
            settings,
            executable: PathBuf::from(PROGRAM),
        }
    }

    /// Runs `executable` instead of looking `wget` up on `PATH`.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    fn args(&self, task: &DownloadTask, ctx: &FetchContext<'_>) -> Vec<OsString> {
        let mut prefix = OsString::from("--directory-prefix=");
        prefix.push(ctx.staging_dir.as_os_str());
        vec![
            "--continue".into(),
            "--content-disposition".into(),
            "--trust-server-names".into(),
            "--no-verbose".into(),
            format!("--connect-timeout={}", self.settings.connect_timeout.as_secs()).into(),
            prefix,
            task.url.as_str().into(),
        ]
    }
}

impl Transport for WgetTransport {
    fn name(&self) -> &'static str {
        PROGRAM
    }

    fn fetch(&self, task: &DownloadTask, ctx: &FetchContext<'_>) -> Result<Staged, FetchError> {
        let log_path = ctx.log_dir.join(format!("{}.log", task.name));
        run_logged(
            PROGRAM,
            &self.executable,
            &self.args(task, ctx),
            &log_path,
            self.settings.task_timeout,
            ctx.cancel,
        )?;
        staged_result(PROGRAM, ctx)
    }
}
