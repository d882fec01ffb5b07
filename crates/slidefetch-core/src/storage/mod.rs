//! On-disk layout of a run and the file lifecycle.
//!
//! Every task downloads into its own staging directory under
//! `<target>/.partial/`. A file becomes visible under its final name in the
//! target directory only after the transfer finished, through
//! [`publish_no_clobber`]. Interrupted transfers stay in staging so the next
//! run can resume them, and the existence filter never mistakes them for
//! finished downloads.

mod part;
mod publish;

pub use part::PartWriter;
pub use publish::{publish_no_clobber, PublishError};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory (inside the target directory) holding in-flight downloads.
pub const STAGING_DIR: &str = ".partial";

/// Directory (inside the target directory) holding per-file transport logs.
pub const LOG_DIR: &str = ".logs";

/// Suffix of the file the built-in transport streams into.
pub const TEMP_SUFFIX: &str = ".part";

/// Control file aria2c keeps next to an unfinished download.
const ARIA2_CONTROL_SUFFIX: &str = ".aria2";

/// Staging directory for the task whose expected local name is `name`.
pub fn staging_dir(target_dir: &Path, name: &str) -> PathBuf {
    target_dir.join(STAGING_DIR).join(name)
}

/// Path for the temp file: appends `.part` (e.g. `slide.svs` → `slide.svs.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Finds the file an external downloader left in `dir` after a successful run.
///
/// Ignores aria2c control files and `.part` leftovers. When several candidates
/// remain, the largest one wins.
pub fn find_staged_file(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut best: Option<(u64, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(ARIA2_CONTROL_SUFFIX) || name.ends_with(TEMP_SUFFIX) {
            continue;
        }
        if best.as_ref().map_or(true, |(len, _)| meta.len() > *len) {
            best = Some((meta.len(), entry.path()));
        }
    }
    Ok(best.map(|(_, path)| path))
}

/// Removes a task's staging directory. Failures are logged, not returned:
/// a leftover directory only costs disk space.
pub fn discard_staging(dir: &Path) {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(dir = %dir.display(), "could not remove staging directory: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("slide.svs"));
        assert_eq!(p.to_string_lossy(), "slide.svs.part");
        let p2 = temp_path(Path::new("/data/wsi/GTEX-1117F-0126"));
        assert_eq!(p2.to_string_lossy(), "/data/wsi/GTEX-1117F-0126.part");
    }

    #[test]
    fn staging_dir_lives_under_target() {
        let dir = staging_dir(Path::new("/data/wsi"), "GTEX-1");
        assert_eq!(dir, Path::new("/data/wsi/.partial/GTEX-1"));
    }

    #[test]
    fn find_staged_file_skips_control_and_part_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("slide.svs"), b"0123456789").unwrap();
        fs::write(dir.path().join("slide.svs.aria2"), vec![0u8; 64]).unwrap();
        fs::write(dir.path().join("other.part"), vec![0u8; 64]).unwrap();
        let found = find_staged_file(dir.path()).unwrap().unwrap();
        assert_eq!(found, dir.path().join("slide.svs"));
    }

    #[test]
    fn find_staged_file_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_staged_file(dir.path()).unwrap().is_none());
    }

    #[test]
    fn discard_staging_is_quiet_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staging_dir(dir.path(), "x");
        discard_staging(&staging);
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("x.part"), b"abc").unwrap();
        discard_staging(&staging);
        assert!(!staging.exists());
    }
}
