//! Errors that stop a whole run before any download starts.

use std::io;
use std::path::PathBuf;

use crate::transport::TransportUnavailable;
use crate::url_list::UrlListError;

/// Exit status for a run that finished (or had nothing to do).
pub const EXIT_OK: i32 = 0;
/// Exit status when at least one task failed, or on a fatal I/O error.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for a missing input or an unusable forced transport.
pub const EXIT_USAGE: i32 = 2;
/// Exit status after Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    UrlList(#[from] UrlListError),
    #[error("cannot create target directory {}: {source}", path.display())]
    TargetDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot list target directory {}: {source}", path.display())]
    ListTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    TransportUnavailable(#[from] TransportUnavailable),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::UrlList(UrlListError::Missing(_)) | RunError::TransportUnavailable(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}
