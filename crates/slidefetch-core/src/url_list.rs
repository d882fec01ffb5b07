//! Reading the newline-delimited URL list.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::url_model;

/// One URL from the list, with the line it came from (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub line: usize,
    pub url: String,
}

impl UrlEntry {
    pub fn new(line: usize, url: impl Into<String>) -> Self {
        Self {
            line,
            url: url.into(),
        }
    }

    /// Expected local file name: the sanitized URL basename.
    pub fn local_name(&self) -> String {
        url_model::local_name(&self.url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UrlListError {
    #[error("URL list not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read URL list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Loads the URL list at `path`.
///
/// Invalid UTF-8 is replaced rather than rejected; see [`parse`] for the
/// line rules.
pub fn load(path: &Path) -> Result<Vec<UrlEntry>, UrlListError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            UrlListError::Missing(path.to_path_buf())
        } else {
            UrlListError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let entries = parse(&String::from_utf8_lossy(&bytes));
    tracing::debug!(path = %path.display(), count = entries.len(), "loaded URL list");
    Ok(entries)
}

/// Parses URL list text: one URL per line, surrounding whitespace trimmed,
/// blank lines and `#` comments ignored, repeated URLs kept once.
pub fn parse(text: &str) -> Vec<UrlEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let url = raw.trim();
        if url.is_empty() || url.starts_with('#') {
            continue;
        }
        if !seen.insert(url) {
            tracing::debug!(line = idx + 1, url, "duplicate URL ignored");
            continue;
        }
        entries.push(UrlEntry::new(idx + 1, url));
    }
    entries
}
