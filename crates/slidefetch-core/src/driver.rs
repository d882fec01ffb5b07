//! One invocation: load the list, filter it, pick a transport, run.

use std::fs;
use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::config::{SlidefetchConfig, TransportPreference};
use crate::error::{RunError, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_OK};
use crate::executor::{effective_concurrency, Executor};
use crate::filter::{self, Plan};
use crate::task::{DownloadTask, TaskState};
use crate::transport::{self, HostProbe, Strategy, SystemProbe, TransportSettings};
use crate::url_list;

/// Everything a run needs, resolved from config file and flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub url_file: PathBuf,
    pub target_dir: PathBuf,
    pub concurrency: usize,
    pub dry_run: bool,
    /// Stop once the target directory holds this many files.
    pub max_files: Option<usize>,
    pub alt_extensions: Vec<String>,
    pub transport: TransportPreference,
    pub settings: TransportSettings,
}

impl RunConfig {
    pub fn from_config(cfg: &SlidefetchConfig) -> Self {
        Self {
            url_file: cfg.url_file.clone(),
            target_dir: cfg.target_dir.clone(),
            concurrency: cfg.concurrency,
            dry_run: false,
            max_files: None,
            alt_extensions: cfg.alt_extensions.clone(),
            transport: cfg.transport,
            settings: TransportSettings::from(cfg),
        }
    }
}

/// Progress notifications, delivered on the thread that called [`Driver::run`].
#[derive(Debug)]
pub enum RunEvent<'a> {
    Started {
        total: usize,
        strategy: Strategy,
        concurrency: usize,
    },
    TaskFinished {
        task: &'a DownloadTask,
        finished: usize,
        total: usize,
    },
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    DryRun { plan: Plan, strategy: Strategy },
    /// The target directory already holds `--max-files` files.
    LimitReached { existing: usize, max_files: usize },
    NothingToDo { already_present: usize },
    Finished(RunSummary),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Finished(summary) => summary.exit_code(),
            _ => EXIT_OK,
        }
    }
}

/// Tasks of a finished run plus what the filter skipped up front.
#[derive(Debug)]
pub struct RunSummary {
    pub tasks: Vec<DownloadTask>,
    pub already_present: usize,
    /// URLs dropped because an earlier URL maps to the same file.
    pub duplicates: usize,
    pub cancelled: bool,
}

impl RunSummary {
    fn count(&self, state: TaskState) -> usize {
        self.tasks.iter().filter(|t| t.state == state).count()
    }

    /// Tasks a worker picked up.
    pub fn attempted(&self) -> usize {
        self.tasks.len() - self.not_started()
    }

    pub fn completed(&self) -> usize {
        self.count(TaskState::Complete)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskState::Failed)
    }

    /// Tasks whose file showed up between planning and publishing.
    pub fn skipped_on_publish(&self) -> usize {
        self.count(TaskState::Skipped)
    }

    pub fn not_started(&self) -> usize {
        self.count(TaskState::Pending)
    }

    /// Interrupted runs exit 130. Otherwise any failed or unstarted task
    /// makes the run fail.
    pub fn exit_code(&self) -> i32 {
        if self.cancelled {
            EXIT_INTERRUPTED
        } else if self.failed() > 0 || self.not_started() > 0 {
            EXIT_FAILURE
        } else {
            EXIT_OK
        }
    }
}

pub struct Driver {
    config: RunConfig,
    probe: Box<dyn HostProbe>,
}

impl Driver {
    pub fn new(config: RunConfig) -> Self {
        Self::with_probe(config, Box::new(SystemProbe))
    }

    pub fn with_probe(config: RunConfig, probe: Box<dyn HostProbe>) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the whole pipeline. Per-task failures end up in the summary;
    /// only precondition and startup I/O errors are returned as `Err`.
    pub fn run(
        &self,
        cancel: &CancelToken,
        on_event: &mut dyn FnMut(RunEvent<'_>),
    ) -> Result<RunOutcome, RunError> {
        let cfg = &self.config;
        let entries = url_list::load(&cfg.url_file)?;
        fs::create_dir_all(&cfg.target_dir).map_err(|source| RunError::TargetDir {
            path: cfg.target_dir.clone(),
            source,
        })?;
        let mut plan = filter::plan(&entries, &cfg.target_dir, &cfg.alt_extensions).map_err(|source| {
            RunError::ListTarget {
                path: cfg.target_dir.clone(),
                source,
            }
        })?;

        if let Some(max_files) = cfg.max_files {
            if plan.existing_files >= max_files {
                tracing::info!(existing = plan.existing_files, max_files, "file limit already reached");
                return Ok(RunOutcome::LimitReached {
                    existing: plan.existing_files,
                    max_files,
                });
            }
            let dropped = plan.truncate_pending(max_files - plan.existing_files);
            if dropped > 0 {
                tracing::info!(dropped, max_files, "pending list capped by file limit");
            }
        }

        if cfg.dry_run {
            let strategy = transport::select(cfg.transport, self.probe.as_ref())?;
            return Ok(RunOutcome::DryRun { plan, strategy });
        }
        if plan.is_empty() {
            return Ok(RunOutcome::NothingToDo {
                already_present: plan.skipped_count(),
            });
        }
        let strategy = transport::select(cfg.transport, self.probe.as_ref())?;

        let concurrency = effective_concurrency(cfg.concurrency);
        let already_present = plan.skipped_count();
        let duplicates = plan.duplicates.len();
        let total = plan.pending.len();
        on_event(RunEvent::Started {
            total,
            strategy,
            concurrency,
        });
        let executor = Executor::new(
            transport::build(strategy, &cfg.settings),
            &cfg.target_dir,
            concurrency,
            cancel.clone(),
        );
        let tasks = executor.run(plan.pending, |task, finished, total| {
            on_event(RunEvent::TaskFinished { task, finished, total })
        });
        let summary = RunSummary {
            tasks,
            already_present,
            duplicates,
            cancelled: cancel.is_cancelled(),
        };
        tracing::info!(
            completed = summary.completed(),
            failed = summary.failed(),
            not_started = summary.not_started(),
            "run finished"
        );
        Ok(RunOutcome::Finished(summary))
    }
}
