use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tuning for the built-in libcurl transport (optional `[curl]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurlConfig {
    /// Abort when throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    pub max_redirections: u32,
}

impl Default for CurlConfig {
    fn default() -> Self {
        Self {
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            max_redirections: 10,
        }
    }
}

/// Which downloader to use. `auto` probes the host: aria2c, then wget, then
/// the built-in client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportPreference {
    #[default]
    Auto,
    /// aria2c, several connections per file.
    Segmented,
    /// wget, one connection per file.
    Simple,
    /// In-process libcurl.
    Builtin,
}

/// Configuration loaded from `~/.config/slidefetch/config.toml`.
/// Every field is optional in the file; command-line flags override it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidefetchConfig {
    /// Parallel downloads (0 = default of 4).
    pub concurrency: usize,
    pub target_dir: PathBuf,
    pub url_file: PathBuf,
    /// Upper bound on a single file's transfer, in seconds.
    pub task_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Connections per file for the segmented transport.
    pub segments_per_file: usize,
    /// Extensions the server may append to a URL basename (e.g. `svs`).
    pub alt_extensions: Vec<String>,
    pub transport: TransportPreference,
    pub curl: CurlConfig,
}

impl Default for SlidefetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            target_dir: PathBuf::from("./wsi_downloads"),
            url_file: PathBuf::from("wsi_urls.txt"),
            task_timeout_secs: 3600,
            connect_timeout_secs: 30,
            segments_per_file: 4,
            alt_extensions: vec!["svs".to_string()],
            transport: TransportPreference::Auto,
            curl: CurlConfig::default(),
        }
    }
}

/// The default config file, if one exists under the XDG config home.
pub fn default_config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("slidefetch")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Loads configuration without writing anything.
///
/// An explicit `path` must exist. Without one, the XDG default is read when
/// present and built-in defaults are used otherwise.
pub fn load(path: Option<&Path>) -> Result<SlidefetchConfig> {
    match path {
        Some(p) => read_from(p),
        None => match default_config_path()? {
            Some(p) => read_from(&p),
            None => {
                tracing::debug!("no config file, using defaults");
                Ok(SlidefetchConfig::default())
            }
        },
    }
}

pub fn read_from(path: &Path) -> Result<SlidefetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: SlidefetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}
