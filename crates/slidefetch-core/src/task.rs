//! Download tasks and their lifecycle.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::url_list::UrlEntry;

/// Where a task is in its lifecycle. `Skipped`, `Complete` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Skipped,
    InProgress,
    Complete,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Skipped | TaskState::Complete | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Skipped => "skipped",
            TaskState::InProgress => "in progress",
            TaskState::Complete => "complete",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One URL to fetch into the target directory.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Line of the URL in the source list.
    pub line: usize,
    pub url: String,
    /// Expected local name, derived from the URL basename.
    pub name: String,
    /// Where the file lands. Starts as `<target>/<name>`; a server-supplied
    /// filename replaces it once the download is published.
    pub destination: PathBuf,
    pub state: TaskState,
    /// Reason for a `Failed` state.
    pub failure: Option<String>,
}

impl DownloadTask {
    pub fn new(entry: &UrlEntry, target_dir: &Path) -> Self {
        let name = entry.local_name();
        Self {
            line: entry.line,
            url: entry.url.clone(),
            destination: target_dir.join(&name),
            name,
            state: TaskState::Pending,
            failure: None,
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.state = TaskState::Failed;
        self.failure = Some(reason.into());
    }

    /// File name of the destination as displayed to the user.
    pub fn display_name(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}
