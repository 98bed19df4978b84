//! Transient download file release.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::download::fetcher::DownloadedFile;

/// Length of a hyphenated v4 id, the stem of every in-progress download.
const ID_LEN: usize = 36;

/// Deletes `path` if it exists.
///
/// Idempotent and infallible: a missing file is fine, any other error is logged.
pub fn cleanup(path: &Path) {
    match fs_err::remove_file(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::error!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Deletes what a previous run left in `dir`: files whose name starts with a
/// download id (templates, `.part` fragments, unmerged streams).
///
/// Finished, titled files are left alone. Returns how many files were removed.
pub fn sweep_leftovers(dir: &Path) -> usize {
    let entries = match fs_err::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot sweep {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let is_leftover = name.get(..ID_LEN).is_some_and(|stem| Uuid::parse_str(stem).is_ok());
        if is_leftover && entry.file_type().is_ok_and(|t| t.is_file()) {
            cleanup(&entry.path());
            removed += 1;
        }
    }
    removed
}

/// Owns a downloaded file until it is released.
///
/// [`TransientFile::release`] deletes the file; if the guard is dropped
/// without being released (early return, panic unwinding) the drop does it.
/// Either way deletion happens exactly once.
#[derive(Debug)]
pub struct TransientFile {
    file: DownloadedFile,
    released: bool,
}

impl TransientFile {
    pub fn new(file: DownloadedFile) -> Self {
        Self { file, released: false }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    pub fn display_name(&self) -> &str {
        &self.file.display_name
    }

    /// Deletes the file now.
    pub fn release(mut self) {
        self.released = true;
        cleanup(&self.file.path);
    }

    /// Gives up ownership without deleting (e.g. `--keep` on the CLI).
    pub fn persist(mut self) -> PathBuf {
        self.released = true;
        std::mem::take(&mut self.file.path)
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if !self.released {
            log::debug!("Releasing {} on drop", self.file.path.display());
            cleanup(&self.file.path);
        }
    }
}
