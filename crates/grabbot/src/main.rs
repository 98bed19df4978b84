use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use teloxide::prelude::*;
use tokio::time::interval;

use grabbot::cli::{Cli, Commands};
use grabbot::logging::{init_logger, log_configuration};
use grabbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TeloxideTransport};
use grabbot::{Conversation, DebounceGate};
use grabcore::core::config::throttle;
use grabcore::{
    available_qualities_or_default, build_spec, sweep_leftovers, Config, DownloadTarget, MediaFetcher, PreferenceStore, QualityLabel,
    WorkerPool, YtDlpExtractor,
};

const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    let cli = Cli::parse_args();

    match cli.resolved_command() {
        Commands::Run => run_bot().await,
        Commands::Probe { url } => {
            let config = offline_config()?;
            probe(&config, url).await
        }
        Commands::Download {
            url,
            audio,
            quality,
            keep,
        } => {
            let config = offline_config()?;
            let target = if *audio {
                DownloadTarget::Audio
            } else {
                DownloadTarget::Video(*quality)
            };
            download(&config, url, target, *keep).await
        }
        Commands::YtdlpVersion => {
            let config = offline_config()?;
            let version = YtDlpExtractor::from_config(&config).version().await?;
            println!("{}", version);
            Ok(())
        }
    }
}

fn offline_config() -> Result<Config> {
    let config = Config::offline_from_env()?;
    config.prepare()?;
    init_logger(&config.log_file_path, config.debug)?;
    Ok(config)
}

fn fetcher_for(config: &Config) -> MediaFetcher {
    let extractor = Arc::new(YtDlpExtractor::from_config(config));
    MediaFetcher::new(
        extractor,
        config.download_dir.clone(),
        WorkerPool::new(config.max_concurrent_downloads),
    )
}

async fn probe(config: &Config, url: &str) -> Result<()> {
    let video = fetcher_for(config).probe(url).await?;
    let qualities: Vec<&str> = available_qualities_or_default(Ok::<_, std::convert::Infallible>(&video.heights))
        .into_iter()
        .map(QualityLabel::as_str)
        .collect();

    println!("{}", video.title);
    println!("{}", video.url);
    println!("qualities: {}", qualities.join(", "));
    Ok(())
}

async fn download(config: &Config, url: &str, target: DownloadTarget, keep: bool) -> Result<()> {
    let file = fetcher_for(config)
        .fetch(url, build_spec(target))
        .await
        .with_context(|| format!("Download of {} as {} failed", url, target))?;

    let size = fs_err::metadata(file.path())?.len();
    println!("{} ({} bytes)", file.display_name(), size);

    if keep {
        let path: PathBuf = file.persist();
        println!("{}", path.display());
    } else {
        file.release();
    }
    Ok(())
}

fn spawn_housekeeping(conversation: Arc<Conversation>) {
    tokio::spawn(async move {
        let mut tick = interval(HOUSEKEEPING_INTERVAL);
        loop {
            tick.tick().await;
            conversation.housekeeping().await;
        }
    });
}

async fn run_bot() -> Result<()> {
    let config = Config::from_env()?;
    config.prepare()?;
    init_logger(&config.log_file_path, config.debug)?;

    log::info!("Starting bot...");
    log_configuration(&config);

    let swept = sweep_leftovers(&config.download_dir);
    if swept > 0 {
        log::info!("Removed {} leftover files from {}", swept, config.download_dir.display());
    }

    match YtDlpExtractor::from_config(&config).version().await {
        Ok(version) => log::info!("yt-dlp version: {}", version),
        Err(e) => log::warn!("Could not determine yt-dlp version ({}): {}", e.subcategory(), e),
    }

    let prefs = Arc::new(PreferenceStore::open(&config.users_db_path));

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let conversation = Arc::new(
        Conversation::new(
            Arc::new(TeloxideTransport::new(bot.clone())),
            fetcher_for(&config),
            Arc::clone(&prefs),
            DebounceGate::new(throttle::message_interval()),
            DebounceGate::new(throttle::callback_interval()),
        )
        .with_event_logging(config.debug),
    );
    spawn_housekeeping(Arc::clone(&conversation));

    let deps = HandlerDeps::new(conversation);

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher stopped, flushing preferences of {} users", prefs.len());
    prefs.flush()?;
    Ok(())
}
