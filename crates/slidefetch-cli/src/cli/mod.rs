//! Command line for slidefetch.

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use slidefetch_core::config::{self, SlidefetchConfig, TransportPreference};
use slidefetch_core::{logging, RunConfig};

use commands::run_downloads;

/// Download every URL in a list that is not already in the target directory.
#[derive(Debug, Parser)]
#[command(name = "slidefetch", version)]
#[command(about = "Resumable batch downloader for whole-slide images", long_about = None)]
pub struct Cli {
    /// Parallel downloads (default 4; 0 means the default).
    #[arg(short = 'c', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Target directory (default ./wsi_downloads).
    #[arg(short = 'o', long, value_name = "PATH")]
    pub outdir: Option<PathBuf>,

    /// File with one URL per line (default wsi_urls.txt).
    #[arg(short = 'u', long, value_name = "PATH")]
    pub urlfile: Option<PathBuf>,

    /// Show what would be downloaded without downloading anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Stop once the target directory holds N files.
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Downloader to use; `auto` picks aria2c, then wget, then the built-in client.
    #[arg(long, value_enum, value_name = "KIND")]
    pub transport: Option<TransportArg>,

    /// Give up on a single file after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Config file (default ~/.config/slidefetch/config.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    Auto,
    Segmented,
    Simple,
    Builtin,
}

impl From<TransportArg> for TransportPreference {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Auto => TransportPreference::Auto,
            TransportArg::Segmented => TransportPreference::Segmented,
            TransportArg::Simple => TransportPreference::Simple,
            TransportArg::Builtin => TransportPreference::Builtin,
        }
    }
}

impl Cli {
    /// Resolves the run from the config file with flags layered on top.
    pub fn run_config(&self, cfg: &SlidefetchConfig) -> RunConfig {
        let mut rc = RunConfig::from_config(cfg);
        if let Some(n) = self.concurrency {
            rc.concurrency = n;
        }
        if let Some(dir) = &self.outdir {
            rc.target_dir = dir.clone();
        }
        if let Some(file) = &self.urlfile {
            rc.url_file = file.clone();
        }
        if let Some(t) = self.transport {
            rc.transport = t.into();
        }
        if let Some(secs) = self.timeout {
            rc.settings.task_timeout = Duration::from_secs(secs.max(1));
        }
        rc.dry_run = self.dry_run;
        rc.max_files = self.max_files;
        rc
    }
}

/// Parses arguments, sets up logging and config, and runs. Returns the exit code.
pub async fn run_from_args() -> Result<i32> {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.log_file.as_deref()) {
        logging::init_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }
    let cfg = config::load(cli.config.as_deref())?;
    tracing::debug!("loaded config: {:?}", cfg);
    run_downloads(cli.run_config(&cfg)).await
}

#[cfg(test)]
mod tests;
