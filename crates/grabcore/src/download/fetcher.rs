//! Probe and fetch on top of a [`MediaExtractor`].

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::core::utils::{sanitize_title, short_id};
use crate::core::validation::canonical_link;
use crate::download::error::{FetchError, ProbeError};
use crate::download::extractor::MediaExtractor;
use crate::download::lifecycle::{cleanup, TransientFile};
use crate::download::spec::{DownloadSpec, DownloadTarget};
use crate::download::worker::WorkerPool;

/// A video as seen by one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub url: String,
    pub title: String,
    pub heights: BTreeSet<u32>,
}

/// A finished download waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    /// File name shown to the user (title or caption)
    pub display_name: String,
    pub target: DownloadTarget,
}

/// Runs probes directly and downloads on a bounded [`WorkerPool`].
#[derive(Clone)]
pub struct MediaFetcher {
    extractor: Arc<dyn MediaExtractor>,
    download_dir: PathBuf,
    pool: WorkerPool,
}

impl MediaFetcher {
    pub fn new(extractor: Arc<dyn MediaExtractor>, download_dir: impl Into<PathBuf>, pool: WorkerPool) -> Self {
        Self {
            extractor,
            download_dir: download_dir.into(),
            pool,
        }
    }

    /// Metadata for `url`. Runs as an async child process, never on the runtime thread.
    pub async fn probe(&self, url: &str) -> Result<VideoRef, ProbeError> {
        let url = canonical_link(url);
        let info = self.extractor.probe(&url).await.map_err(|e| {
            log::warn!("Probe of {} via {} failed ({}): {}", url, self.extractor.name(), e.subcategory(), e);
            ProbeError(e)
        })?;

        Ok(VideoRef {
            url,
            title: info.title,
            heights: info.heights,
        })
    }

    /// Downloads `url` according to `spec` on the worker pool.
    ///
    /// The caller may stop awaiting; the download still runs to completion and
    /// a result nobody receives is deleted when the worker drops it.
    pub async fn fetch(&self, url: &str, spec: DownloadSpec) -> Result<TransientFile, FetchError> {
        let (reply, response) = oneshot::channel();
        let extractor = Arc::clone(&self.extractor);
        let dir = self.download_dir.clone();
        let url = canonical_link(url);

        log::debug!(
            "Queueing fetch of {} ({}/{} workers idle)",
            url,
            self.pool.idle(),
            self.pool.size()
        );

        let handle = self.pool.submit(async move {
            let result = run_fetch(extractor.as_ref(), &dir, &url, &spec)
                .await
                .map(TransientFile::new);
            if let Err(Ok(orphan)) = reply.send(result) {
                log::warn!("Requester went away, discarding {}", orphan.path().display());
            }
        });

        match response.await {
            Ok(result) => result,
            // The worker dropped the sender without replying: it panicked.
            Err(_) => handle.join().await.and(Err(FetchError::WorkerLost)),
        }
    }
}

async fn run_fetch(
    extractor: &dyn MediaExtractor,
    dir: &Path,
    url: &str,
    spec: &DownloadSpec,
) -> Result<DownloadedFile, FetchError> {
    let id = Uuid::new_v4().to_string();
    let template = dir.join(format!("{}.%(ext)s", id));
    let extension = spec.output_extension();

    log::info!("Fetching {} as {} ({})", url, spec.target, id);

    let outcome = match extractor.download(url, spec, &template).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Download {} failed ({}): {}", id, e.subcategory(), e);
            discard_partials(dir, &id);
            return Err(e.into());
        }
    };

    let produced = match find_output_file(dir, &id, extension) {
        Ok(path) => path,
        Err(e) => {
            discard_partials(dir, &id);
            return Err(e);
        }
    };

    let title = match outcome.title.filter(|t| !t.trim().is_empty()) {
        Some(title) => title,
        None => match extractor.probe(url).await {
            Ok(info) => info.title,
            Err(e) => {
                log::warn!("Could not read title for {}: {}", url, e);
                "video".to_string()
            }
        },
    };

    let final_path = match reserve_final_path(dir, &title, spec.target, &id, extension) {
        Ok(path) => path,
        Err(e) => {
            discard_partials(dir, &id);
            return Err(e);
        }
    };
    if let Err(e) = fs_err::rename(&produced, &final_path) {
        cleanup(&final_path);
        discard_partials(dir, &id);
        return Err(e.into());
    }

    let display_name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.{}", id, extension));

    log::info!("Fetched {} -> {}", id, final_path.display());
    Ok(DownloadedFile {
        path: final_path,
        display_name,
        target: spec.target,
    })
}

/// Locates the file the extractor produced for `id`.
///
/// Matches on the id prefix and the expected extension; the newest match wins.
pub fn find_output_file(dir: &Path, id: &str, extension: &'static str) -> Result<PathBuf, FetchError> {
    let suffix = format!(".{}", extension);
    let not_found = || FetchError::NoOutputFile {
        id: id.to_string(),
        extension,
    };

    let mut found: Vec<(std::time::SystemTime, PathBuf)> = fs_err::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(id) && name.ends_with(&suffix)
        })
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect();

    found.sort();
    match found.pop() {
        Some((_, path)) => Ok(path),
        None => {
            log::error!("No file matching {}*{} in {}", id, suffix, dir.display());
            Err(not_found())
        }
    }
}

/// Claims a human-readable destination by creating it empty.
///
/// Creation is exclusive, so two downloads of the same title never end up on
/// one path. A taken name falls back to a short id suffix, then the full id.
fn reserve_final_path(
    dir: &Path,
    title: &str,
    target: DownloadTarget,
    id: &str,
    extension: &str,
) -> Result<PathBuf, FetchError> {
    let safe = sanitize_title(title);
    let stem = match target {
        DownloadTarget::Audio => safe,
        DownloadTarget::Video(quality) => format!("{}_{}", safe, quality),
    };

    let candidates = [
        stem.clone(),
        format!("{}_{}", stem, short_id(id)),
        format!("{}_{}", stem, id),
    ];
    for candidate in candidates {
        let path = dir.join(format!("{}.{}", candidate, extension));
        match fs_err::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                log::debug!("{} is taken", path.display());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(std::io::Error::new(ErrorKind::AlreadyExists, format!("no free file name for '{}'", stem)).into())
}

/// Removes leftovers (`.part`, unmerged streams) of a failed download.
fn discard_partials(dir: &Path, id: &str) {
    let Ok(entries) = fs_err::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        if entry.file_name().to_string_lossy().starts_with(id) {
            cleanup(&entry.path());
        }
    }
}
