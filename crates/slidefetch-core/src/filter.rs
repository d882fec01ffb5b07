//! Existence filter: which URLs still need downloading.
//!
//! A URL is already present when a regular file in the target directory has
//! exactly its basename, or its basename plus one of the configured alternate
//! extensions (`GTEX-1117F-0126` vs. `GTEX-1117F-0126.svs`). Size and content
//! are not inspected. Staging and log directories are never listed.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::task::DownloadTask;
use crate::url_list::UrlEntry;

/// A URL that needs no download, with the file that satisfied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub entry: UrlEntry,
    pub existing: String,
}

/// Result of filtering a URL list against the target directory.
#[derive(Debug, Clone)]
pub struct Plan {
    pub target_dir: PathBuf,
    /// Tasks to run, in URL-list order.
    pub pending: Vec<DownloadTask>,
    /// Already-present URLs, in URL-list order.
    pub skipped: Vec<Skip>,
    /// URLs whose local name an earlier pending URL already claimed. They
    /// would download to the same file, so only the first one runs.
    pub duplicates: Vec<Skip>,
    /// Number of regular files found in the target directory.
    pub existing_files: usize,
}

impl Plan {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// True when there is nothing to download.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Keeps only the first `max` pending tasks. Returns how many were dropped.
    pub fn truncate_pending(&mut self, max: usize) -> usize {
        let dropped = self.pending.len().saturating_sub(max);
        self.pending.truncate(max);
        dropped
    }
}

/// Names of the regular files directly inside `dir`. A missing directory is empty.
pub fn existing_files(dir: &Path) -> io::Result<HashSet<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e),
    };
    let mut names = HashSet::new();
    for entry in entries {
        let entry = entry?;
        // Follows symlinks so a linked slide counts as present.
        if fs::metadata(entry.path()).map(|m| m.is_file()).unwrap_or(false) {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Splits `entries` into pending tasks and skips against a known file set.
/// Pure: the same inputs always give the same plan.
pub fn partition(
    entries: &[UrlEntry],
    existing: &HashSet<String>,
    alt_extensions: &[String],
    target_dir: &Path,
) -> Plan {
    let mut pending = Vec::new();
    let mut skipped = Vec::new();
    let mut duplicates = Vec::new();
    let mut claimed = HashSet::new();

    for entry in entries {
        let name = entry.local_name();
        if let Some(found) = present_as(&name, existing, alt_extensions) {
            skipped.push(Skip {
                entry: entry.clone(),
                existing: found,
            });
        } else if !claimed.insert(name.clone()) {
            duplicates.push(Skip {
                entry: entry.clone(),
                existing: name,
            });
        } else {
            pending.push(DownloadTask::new(entry, target_dir));
        }
    }

    Plan {
        target_dir: target_dir.to_path_buf(),
        pending,
        skipped,
        duplicates,
        existing_files: existing.len(),
    }
}

/// Lists `target_dir` and partitions `entries` against it.
pub fn plan(entries: &[UrlEntry], target_dir: &Path, alt_extensions: &[String]) -> io::Result<Plan> {
    let existing = existing_files(target_dir)?;
    let plan = partition(entries, &existing, alt_extensions, target_dir);
    tracing::info!(
        total = entries.len(),
        pending = plan.pending.len(),
        skipped = plan.skipped.len(),
        duplicates = plan.duplicates.len(),
        "filtered URL list against {}",
        target_dir.display()
    );
    Ok(plan)
}

fn present_as(name: &str, existing: &HashSet<String>, alt_extensions: &[String]) -> Option<String> {
    if existing.contains(name) {
        return Some(name.to_string());
    }
    alt_extensions
        .iter()
        .map(|ext| format!("{}.{}", name, ext.trim_start_matches('.')))
        .find(|candidate| existing.contains(candidate))
}
