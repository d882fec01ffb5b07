//! Fetch strategies behind one trait.
//!
//! The executor hands each task to a [`Transport`], which downloads into the
//! task's staging directory and reports the finished file. Three strategies
//! exist, tried in this order when the preference is `auto`:
//!
//! 1. [`Aria2Transport`]: segmented, several connections per file.
//! 2. [`WgetTransport`]: one connection per file.
//! 3. [`CurlTransport`]: in-process libcurl, always available.

mod aria2;
mod builtin;
mod error;
mod probe;
mod process;
mod wget;

pub use aria2::Aria2Transport;
pub use builtin::CurlTransport;
pub use error::{classify_curl_error, classify_exit_code, classify_http_status, ErrorKind, FetchError};
pub use probe::{HostProbe, SystemProbe};
pub use wget::WgetTransport;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::config::{SlidefetchConfig, TransportPreference};
use crate::task::DownloadTask;

/// What a transport gets besides the task itself.
pub struct FetchContext<'a> {
    /// Empty or partially filled directory owned by this task.
    pub staging_dir: &'a Path,
    /// Where external programs write their per-file logs.
    pub log_dir: &'a Path,
    pub cancel: &'a CancelToken,
}

/// A finished download waiting in staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    pub path: PathBuf,
    /// Name to publish under in the target directory.
    pub file_name: String,
}

/// One way of fetching a URL. Implementations block until the file is
/// complete, the transfer fails, or the cancel token fires.
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;
    fn fetch(&self, task: &DownloadTask, ctx: &FetchContext<'_>) -> Result<Staged, FetchError>;
}

/// Timeouts and tuning shared by all transports.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub task_timeout: Duration,
    pub connect_timeout: Duration,
    pub segments_per_file: usize,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub max_redirections: u32,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self::from(&SlidefetchConfig::default())
    }
}

impl From<&SlidefetchConfig> for TransportSettings {
    fn from(cfg: &SlidefetchConfig) -> Self {
        Self {
            task_timeout: Duration::from_secs(cfg.task_timeout_secs.max(1)),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs.max(1)),
            segments_per_file: cfg.segments_per_file.clamp(1, 16),
            low_speed_limit: cfg.curl.low_speed_limit,
            low_speed_time: Duration::from_secs(cfg.curl.low_speed_time_secs),
            max_redirections: cfg.curl.max_redirections,
        }
    }
}

/// The strategy chosen for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Segmented,
    Simple,
    Builtin,
}

impl Strategy {
    /// External program the strategy needs, if any.
    pub fn program(self) -> Option<&'static str> {
        match self {
            Strategy::Segmented => Some(aria2::PROGRAM),
            Strategy::Simple => Some(wget::PROGRAM),
            Strategy::Builtin => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Segmented => "aria2c (segmented)",
            Strategy::Simple => "wget (single connection)",
            Strategy::Builtin => "curl (built-in)",
        };
        f.write_str(s)
    }
}

/// A forced strategy whose program is not installed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{program} was requested but is not available on this host")]
pub struct TransportUnavailable {
    pub program: &'static str,
}

/// Picks the strategy for `preference`, probing the host once per program.
pub fn select(
    preference: TransportPreference,
    probe: &dyn HostProbe,
) -> Result<Strategy, TransportUnavailable> {
    let require = |strategy: Strategy| match strategy.program() {
        Some(program) if !probe.has_program(program) => Err(TransportUnavailable { program }),
        _ => Ok(strategy),
    };

    let strategy = match preference {
        TransportPreference::Auto => {
            if probe.has_program(aria2::PROGRAM) {
                Strategy::Segmented
            } else if probe.has_program(wget::PROGRAM) {
                Strategy::Simple
            } else {
                Strategy::Builtin
            }
        }
        TransportPreference::Segmented => require(Strategy::Segmented)?,
        TransportPreference::Simple => require(Strategy::Simple)?,
        TransportPreference::Builtin => Strategy::Builtin,
    };
    tracing::info!(?preference, %strategy, "selected transport");
    Ok(strategy)
}

/// Builds the transport for `strategy`.
pub fn build(strategy: Strategy, settings: &TransportSettings) -> Arc<dyn Transport> {
    match strategy {
        Strategy::Segmented => Arc::new(Aria2Transport::new(settings.clone())),
        Strategy::Simple => Arc::new(WgetTransport::new(settings.clone())),
        Strategy::Builtin => Arc::new(CurlTransport::new(settings.clone())),
    }
}
