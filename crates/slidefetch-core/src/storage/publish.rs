//! Moving a finished download into the target directory without clobbering.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Something already occupies the destination name; it was left untouched.
    #[error("destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Publishes `staged` as `dest`, refusing to replace an existing file.
///
/// A hard link is created first: it fails atomically when `dest` exists, so a
/// concurrent writer can never be overwritten. Filesystems without hard links
/// get an existence check followed by a rename.
pub fn publish_no_clobber(staged: &Path, dest: &Path) -> Result<(), PublishError> {
    match fs::hard_link(staged, dest) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(staged) {
                tracing::debug!(path = %staged.display(), "staged copy not removed: {}", e);
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(PublishError::AlreadyExists(dest.to_path_buf()))
        }
        Err(e) => {
            tracing::debug!("hard link failed ({}), falling back to rename", e);
            if fs::symlink_metadata(dest).is_ok() {
                return Err(PublishError::AlreadyExists(dest.to_path_buf()));
            }
            fs::rename(staged, dest).map_err(|source| PublishError::Io {
                from: staged.to_path_buf(),
                to: dest.to_path_buf(),
                source,
            })
        }
    }
}
