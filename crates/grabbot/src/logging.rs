//! Logger initialization and startup diagnostics.

use std::path::Path;

use anyhow::{Context, Result};
use grabcore::Config;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};

pub fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initialize logger for both console and file output.
///
/// The file is appended to, and its parent directory created if missing.
pub fn init_logger(log_file_path: &Path, debug: bool) -> Result<()> {
    if let Some(parent) = log_file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent).context("Failed to create log directory")?;
    }
    let log_file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .context("Failed to open log file")?;

    let level = level_for(debug);
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration. The token is never printed.
pub fn log_configuration(config: &Config) {
    log::info!("Download directory: {}", config.download_dir.display());
    log::info!("Preferences file: {}", config.users_db_path.display());
    match &config.api_url {
        Some(url) => log::info!("Bot API server: {}", url),
        None => log::info!("Bot API server: api.telegram.org"),
    }
    log::info!(
        "Timeouts: probe {}s, fetch {}s; {} concurrent downloads",
        config.probe_timeout.as_secs(),
        config.fetch_timeout.as_secs(),
        config.max_concurrent_downloads
    );
    if config.debug {
        log::info!("Debug mode: every inbound event is logged");
    }
}
