//! Extractor that writes a small file where yt-dlp would.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use grabcore::download::{
    DownloadOutcome, DownloadSpec, ExtractorError, ExtractorFailureKind, MediaExtractor, ProbeInfo,
};

pub struct FakeExtractor {
    pub title: String,
    pub heights: BTreeSet<u32>,
    pub fail_probe: bool,
    pub fail_download: bool,
    probes: AtomicUsize,
    downloads: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(title: &str, heights: &[u32]) -> Self {
        Self {
            title: title.to_string(),
            heights: heights.iter().copied().collect(),
            fail_probe: false,
            fail_download: false,
            probes: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    pub fn failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

fn unavailable() -> ExtractorError {
    ExtractorError::Failed {
        kind: ExtractorFailureKind::VideoUnavailable,
        stderr: "ERROR: [youtube] dQw4w9WgXcQ: Video unavailable".to_string(),
    }
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    fn name(&self) -> &str {
        "fake"
    }

    async fn probe(&self, _url: &str) -> Result<ProbeInfo, ExtractorError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail_probe {
            return Err(unavailable());
        }
        Ok(ProbeInfo {
            title: self.title.clone(),
            heights: self.heights.clone(),
        })
    }

    async fn download(
        &self,
        _url: &str,
        spec: &DownloadSpec,
        output_template: &Path,
    ) -> Result<DownloadOutcome, ExtractorError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let template = output_template.to_string_lossy();

        if self.fail_download {
            // yt-dlp leaves fragments behind when it dies mid-way
            let partial = template.replace("%(ext)s", "part");
            std::fs::write(&partial, b"partial").map_err(ExtractorError::Spawn)?;
            return Err(unavailable());
        }

        let output = template.replace("%(ext)s", spec.output_extension());
        std::fs::write(&output, b"media").map_err(ExtractorError::Spawn)?;
        Ok(DownloadOutcome {
            title: Some(self.title.clone()),
        })
    }
}
