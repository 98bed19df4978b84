//! yt-dlp backed [`MediaExtractor`].

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::config::Config;
use crate::download::error::ExtractorError;
use crate::download::extractor::{DownloadOutcome, MediaExtractor, ProbeInfo};
use crate::download::spec::{DownloadSpec, Postprocess};
use crate::download::ytdlp_errors::analyze_ytdlp_error;

/// Runs the `yt-dlp` binary as a child process.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    bin: String,
    probe_timeout: Duration,
    fetch_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    height: Option<f64>,
    vcodec: Option<String>,
}

impl YtDlpExtractor {
    pub fn new(bin: impl Into<String>, probe_timeout: Duration, fetch_timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            probe_timeout,
            fetch_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ytdl_bin.clone(), config.probe_timeout, config.fetch_timeout)
    }

    /// `yt-dlp --version`
    pub async fn version(&self) -> Result<String, ExtractorError> {
        let output = self.run(&["--version".to_string()], self.probe_timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run(&self, args: &[String], limit: Duration) -> Result<Output, ExtractorError> {
        log::debug!("{} {}", self.bin, args.join(" "));

        let child = Command::new(&self.bin).args(args).kill_on_drop(true).output();
        let output = timeout(limit, child)
            .await
            .map_err(|_| ExtractorError::Timeout(limit))?
            .map_err(ExtractorError::Spawn)?;

        if output.status.success() {
            Ok(output)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let kind = analyze_ytdlp_error(&stderr);
            log::warn!("yt-dlp exited with {} ({}): {}", output.status, kind, stderr.trim());
            Err(ExtractorError::Failed { kind, stderr })
        }
    }
}

/// Arguments for a metadata-only run printing one JSON document.
pub fn build_probe_args(url: &str) -> Vec<String> {
    // `--` ends option parsing so a link can never be read as a flag
    ["--dump-single-json", "--no-playlist", "--skip-download", "--no-warnings", "--", url]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Arguments for a download run.
pub fn build_download_args(url: &str, spec: &DownloadSpec, output_template: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-playlist".into(),
        "--no-progress".into(),
        "-f".into(),
        spec.format_selector.clone(),
        "-o".into(),
        output_template.to_string_lossy().into_owned(),
        "--retries".into(),
        spec.retries.to_string(),
        "--fragment-retries".into(),
        spec.fragment_retries.to_string(),
        "--print".into(),
        "after_move:title".into(),
    ];
    if spec.skip_unavailable_fragments {
        args.push("--skip-unavailable-fragments".into());
    }

    match &spec.postprocess {
        Postprocess::ExtractAudio { codec, quality } => {
            args.extend(["-x", "--audio-format", *codec, "--audio-quality", *quality].map(String::from));
        }
        Postprocess::MuxVideo { container } => {
            args.extend(["--merge-output-format", *container, "--recode-video", *container].map(String::from));
            args.push("--no-keep-video".into());
        }
    }

    args.push("--".into());
    args.push(url.to_string());
    args
}

/// Parses `--dump-single-json` output.
///
/// Heights are taken from formats that carry video (`vcodec` other than `none`).
pub fn parse_probe_output(stdout: &[u8]) -> Result<ProbeInfo, ExtractorError> {
    let raw: RawInfo = serde_json::from_slice(stdout)?;

    let heights: BTreeSet<u32> = raw
        .formats
        .iter()
        .filter(|f| f.vcodec.as_deref() != Some("none"))
        .filter_map(|f| f.height)
        .filter(|h| h.is_finite() && *h >= 1.0)
        .map(|h| h.round() as u32)
        .collect();

    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "video".to_string());

    Ok(ProbeInfo { title, heights })
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<ProbeInfo, ExtractorError> {
        let output = self.run(&build_probe_args(url), self.probe_timeout).await?;
        parse_probe_output(&output.stdout)
    }

    async fn download(
        &self,
        url: &str,
        spec: &DownloadSpec,
        output_template: &Path,
    ) -> Result<DownloadOutcome, ExtractorError> {
        let args = build_download_args(url, spec, output_template);
        let output = self.run(&args, self.fetch_timeout).await?;

        let title = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(str::to_string);
        Ok(DownloadOutcome { title })
    }
}
