//! Segmented downloads through `aria2c`.

use std::ffi::OsString;
use std::path::PathBuf;

use super::process::run_logged;
use super::{FetchContext, FetchError, Staged, Transport, TransportSettings};
use crate::storage;
use crate::task::DownloadTask;

pub(super) const PROGRAM: &str = "aria2c";

/// Runs one `aria2c` per file with several connections, resuming from its
/// own `.aria2` control file when the staging directory already holds one.
pub struct Aria2Transport {
    settings: TransportSettings,
    executable: PathBuf,
}

impl Aria2Transport {
    pub fn new(settings: TransportSettings) -> Self {
        Self {
            settings,
            executable: PathBuf::from(PROGRAM),
        }
    }

    /// Runs `executable` instead of looking `aria2c` up on `PATH`.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    fn args(&self, task: &DownloadTask, ctx: &FetchContext<'_>) -> Vec<OsString> {
        let segments = self.settings.segments_per_file;
        let mut dir = OsString::from("--dir=");
        dir.push(ctx.staging_dir.as_os_str());
        vec![
            dir,
            format!("--max-connection-per-server={}", segments).into(),
            format!("--split={}", segments).into(),
            "--continue=true".into(),
            "--auto-file-renaming=false".into(),
            "--allow-overwrite=false".into(),
            format!("--connect-timeout={}", self.settings.connect_timeout.as_secs()).into(),
            "--summary-interval=0".into(),
            "--console-log-level=warn".into(),
            task.url.as_str().into(),
        ]
    }
}

impl Transport for Aria2Transport {
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

/// Turns the single file an external program left in staging into a [`Staged`].
pub(super) fn staged_result(program: &'static str, ctx: &FetchContext<'_>) -> Result<Staged, FetchError> {
    let path = storage::find_staged_file(ctx.staging_dir)?.ok_or_else(|| FetchError::NothingStaged {
        program,
        dir: ctx.staging_dir.to_path_buf(),
    })?;
    let raw = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = crate::url_model::sanitize_filename(&raw);
    Ok(Staged { path, file_name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::url_list::UrlEntry;
    use std::path::Path;

    #[cfg(unix)]
    mod with_fake_aria2c {
        use super::*;
        use crate::executor::Executor;
        use crate::task::TaskState;
        use crate::transport::process::write_script;
        use std::fs;
        use std::sync::Arc;

        /// Parses `--dir=` like aria2c and writes the server-named file there.
        const FAKE_ARIA2C: &str = r#"for arg in "$@"; do
  case "$arg" in
    --dir=*) dir="${arg#--dir=}" ;;
  esac
done
echo "downloading into $dir"
printf 'slide bytes' > "$dir/GTEX-1.svs""#;

        fn run_with(script: &str) -> (tempfile::TempDir, DownloadTask) {
            let dir = tempfile::tempdir().unwrap();
            let tool = write_script(dir.path(), "aria2c", script);
            let target = dir.path().join("out");
            fs::create_dir_all(&target).unwrap();
            let transport = Aria2Transport::new(TransportSettings::default()).with_executable(tool);
            let task = DownloadTask::new(&UrlEntry::new(1, "https://brd.example/GTEX-1"), &target);
            let mut done = Executor::new(Arc::new(transport), &target, 1, CancelToken::new())
                .run(vec![task], |_, _, _| {});
            (dir, done.remove(0))
        }

        #[test]
        fn publishes_the_file_aria2c_left_in_staging() {
            let (dir, task) = run_with(FAKE_ARIA2C);
            let target = dir.path().join("out");
            assert_eq!(task.state, TaskState::Complete);
            assert_eq!(task.destination, target.join("GTEX-1.svs"));
            assert_eq!(fs::read(target.join("GTEX-1.svs")).unwrap(), b"slide bytes");
            assert!(!storage::staging_dir(&target, "GTEX-1").exists());
            let log = fs::read_to_string(target.join(storage::LOG_DIR).join("GTEX-1.log")).unwrap();
            assert!(log.contains("downloading into"));
        }

        #[test]
        fn failed_aria2c_keeps_staging_for_resume() {
            let script = FAKE_ARIA2C.replace("printf 'slide bytes'", "printf 'slide'") + "
exit 6";
            let (dir, task) = run_with(&script);
            let target = dir.path().join("out");
            assert_eq!(task.state, TaskState::Failed);
            assert_eq!(task.failure.as_deref(), Some("aria2c exited with status 6"));
            assert!(!target.join("GTEX-1.svs").exists());
            let staged = storage::staging_dir(&target, "GTEX-1").join("GTEX-1.svs");
            assert_eq!(fs::read(staged).unwrap(), b"slide");
        }
    }

    #[test]
    fn args_point_aria2c_at_staging() {
        let mut settings = TransportSettings::default();
        settings.segments_per_file = 8;
        let transport = Aria2Transport::new(settings);
        let task = DownloadTask::new(&UrlEntry::new(1, "https://brd.example/GTEX-1"), Path::new("out"));
        let cancel = CancelToken::new();
        let ctx = FetchContext {
            staging_dir: Path::new("out/.partial/GTEX-1"),
            log_dir: Path::new("out/.logs"),
            cancel: &cancel,
        };
        let args: Vec<String> = transport
            .args(&task, &ctx)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[0], "--dir=out/.partial/GTEX-1");
        assert!(args.contains(&"--split=8".to_string()));
        assert!(args.contains(&"--max-connection-per-server=8".to_string()));
        assert!(args.contains(&"--continue=true".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://brd.example/GTEX-1"));
    }

    #[test]
    fn staged_result_requires_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        let ctx = FetchContext {
            staging_dir: dir.path(),
            log_dir: dir.path(),
            cancel: &cancel,
        };
        assert!(matches!(
            staged_result(PROGRAM, &ctx),
            Err(FetchError::NothingStaged { .. })
        ));

        std::fs::write(dir.path().join("GTEX-1.svs"), b"data").unwrap();
        let staged = staged_result(PROGRAM, &ctx).unwrap();
        assert_eq!(staged.file_name, "GTEX-1.svs");
        assert_eq!(staged.path, dir.path().join("GTEX-1.svs"));
    }
}
