//! Append-only writer for the built-in transport's `.part` file.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sequential writer for a resumable `.part` file.
///
/// Opened in append mode: whatever a previous, interrupted run left behind is
/// kept and its length is the offset to resume from.
pub struct PartWriter {
    file: File,
    path: PathBuf,
    written: u64,
}

impl PartWriter {
    /// Opens (or creates) `path` and returns the writer together with the
    /// number of bytes already present.
    pub fn open_resume(path: &Path) -> io::Result<(Self, u64)> {
        let file = File::options().create(true).append(true).open(path)?;
        let existing = file.metadata()?.len();
        Ok((
            PartWriter {
                file,
                path: path.to_path_buf(),
                written: 0,
            },
            existing,
        ))
    }

    /// Appends `data`.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Discards everything in the file, including bytes from earlier runs.
    /// Used when the server ignores a range request and resends from byte 0.
    pub fn restart(&mut self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.written = 0;
        Ok(())
    }

    /// Bytes appended through this writer since it was opened or restarted.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Sync file data to disk before the file is published.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
