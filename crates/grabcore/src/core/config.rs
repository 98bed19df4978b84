//! Process configuration.
//!
//! Values are read once from the environment at startup, validated, and then
//! passed around as an immutable [`Config`]. Nothing here is reloadable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default directory for transient downloads.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
/// Default preference file.
pub const DEFAULT_USERS_DB_PATH: &str = "data/users.json";
/// Default log file.
pub const DEFAULT_LOG_FILE_PATH: &str = "logs/bot.log";
/// Default yt-dlp binary.
pub const DEFAULT_YTDL_BIN: &str = "yt-dlp";

const OFFLINE_TOKEN: &str = "offline";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN (or TELOXIDE_TOKEN) is not set")]
    MissingToken,

    #[error("Invalid LOCAL_API_URL '{value}': {source}")]
    InvalidApiUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Failed to create download directory {path}: {source}")]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Inbound throttling intervals
pub mod throttle {
    use super::Duration;

    /// Minimum gap between two accepted text messages of one user (milliseconds)
    pub const MESSAGE_INTERVAL_MS: u64 = 500;

    /// Minimum gap between two accepted button presses of one user (milliseconds)
    pub const CALLBACK_INTERVAL_MS: u64 = 300;

    pub fn message_interval() -> Duration {
        Duration::from_millis(MESSAGE_INTERVAL_MS)
    }

    pub fn callback_interval() -> Duration {
        Duration::from_millis(CALLBACK_INTERVAL_MS)
    }
}

/// yt-dlp invocation settings
pub mod ytdlp {
    /// Whole-download retries handed to yt-dlp
    pub const RETRIES: u32 = 10;

    /// Per-fragment retries handed to yt-dlp
    pub const FRAGMENT_RETRIES: u32 = 10;

    /// Target bitrate for extracted audio
    pub const AUDIO_QUALITY: &str = "192K";

    pub const AUDIO_CODEC: &str = "mp3";

    pub const VIDEO_CONTAINER: &str = "mp4";
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds).
    /// Large because video uploads through a local Bot API server can be slow.
    pub const REQUEST_TIMEOUT_SECS: u64 = 900;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: SecretString,
    /// Alternate Bot API endpoint (e.g. a local `telegram-bot-api` server)
    pub api_url: Option<Url>,
    pub download_dir: PathBuf,
    /// Bound for a metadata probe
    pub probe_timeout: Duration,
    /// Bound for one download run
    pub fetch_timeout: Duration,
    pub debug: bool,
    pub ytdl_bin: String,
    pub users_db_path: PathBuf,
    pub log_file_path: PathBuf,
    pub max_concurrent_downloads: usize,
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration for commands that never talk to Telegram; a missing token is tolerated.
    pub fn offline_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match (key, std::env::var(key).ok()) {
            ("BOT_TOKEN", value) => value
                .filter(|v| !v.trim().is_empty())
                .or_else(|| Some(OFFLINE_TOKEN.to_string())),
            (_, value) => value,
        })
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = get("BOT_TOKEN").or_else(|| get("TELOXIDE_TOKEN")).ok_or(ConfigError::MissingToken)?;

        let api_url = match get("LOCAL_API_URL").or_else(|| get("BOT_API_URL")) {
            Some(value) => Some(Url::parse(&value).map_err(|source| ConfigError::InvalidApiUrl { value, source })?),
            None => None,
        };

        Ok(Self {
            bot_token: SecretString::from(token),
            api_url,
            download_dir: get("DOWNLOAD_DIR").unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string()).into(),
            probe_timeout: Duration::from_secs(parse_number(&get, "TIMEOUT", 60)?),
            fetch_timeout: Duration::from_secs(parse_number(&get, "FETCH_TIMEOUT", 1800)?),
            debug: get("DEBUG").is_some_and(|v| parse_flag(&v)),
            ytdl_bin: get("YTDL_BIN").unwrap_or_else(|| DEFAULT_YTDL_BIN.to_string()),
            users_db_path: get("USERS_DB_PATH")
                .unwrap_or_else(|| DEFAULT_USERS_DB_PATH.to_string())
                .into(),
            log_file_path: get("LOG_FILE_PATH")
                .unwrap_or_else(|| DEFAULT_LOG_FILE_PATH.to_string())
                .into(),
            max_concurrent_downloads: match parse_number(&get, "MAX_CONCURRENT_DOWNLOADS", 4)? {
                0 => {
                    return Err(ConfigError::InvalidNumber {
                        key: "MAX_CONCURRENT_DOWNLOADS",
                        value: "0".to_string(),
                    })
                }
                n => usize::try_from(n).unwrap_or(usize::MAX),
            },
        })
    }

    /// Startup checks with side effects: creates the download directory.
    pub fn prepare(&self) -> Result<(), ConfigError> {
        ensure_dir(&self.download_dir)
    }
}

fn ensure_dir(path: &Path) -> Result<(), ConfigError> {
    fs_err::create_dir_all(path).map_err(|source| ConfigError::DownloadDir {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_number<G>(get: &G, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}

/// `true`, `1` and `t` (any case) enable a flag; everything else disables it.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.bot_token.expose_secret(), "123:abc");
        assert!(config.api_url.is_none());
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.probe_timeout, Duration::from_secs(60));
        assert_eq!(config.fetch_timeout, Duration::from_secs(1800));
        assert!(!config.debug);
        assert_eq!(config.ytdl_bin, "yt-dlp");
        assert_eq!(config.max_concurrent_downloads, 4);
    }

    #[test]
    fn test_missing_token_rejected() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_teloxide_token_fallback() {
        let config = Config::from_lookup(lookup(&[("TELOXIDE_TOKEN", "42:xyz")])).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "42:xyz");
    }

    #[test]
    fn test_api_url_validated() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("LOCAL_API_URL", "http://localhost:8081"),
        ]))
        .unwrap();
        assert_eq!(config.api_url.unwrap().as_str(), "http://localhost:8081/");

        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("LOCAL_API_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiUrl { .. }));
    }

    #[test]
    fn test_numbers_validated() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("TIMEOUT", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "TIMEOUT", .. }));

        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("MAX_CONCURRENT_DOWNLOADS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("TIMEOUT", "15")])).unwrap();
        assert_eq!(config.probe_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_parse_flag() {
        for on in ["true", "TRUE", "1", "t", "T"] {
            assert!(parse_flag(on), "{on} should enable");
        }
        for off in ["false", "0", "yes", "", "f"] {
            assert!(!parse_flag(off), "{off} should disable");
        }
    }

    #[test]
    fn test_prepare_creates_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("downloads");
        let target_str = target.to_string_lossy().to_string();
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("DOWNLOAD_DIR", target_str.as_str())])).unwrap();

        config.prepare().unwrap();
        assert!(target.is_dir());
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("BOT_TOKEN", "env:token");
        std::env::set_var("DEBUG", "1");
        let config = Config::from_env().unwrap();
        std::env::remove_var("BOT_TOKEN");
        std::env::remove_var("DEBUG");

        assert_eq!(config.bot_token.expose_secret(), "env:token");
        assert!(config.debug);
    }

    #[test]
    #[serial_test::serial]
    fn test_offline_config_tolerates_missing_token() {
        std::env::remove_var("BOT_TOKEN");
        std::env::remove_var("TELOXIDE_TOKEN");
        assert!(matches!(Config::from_env(), Err(ConfigError::MissingToken)));

        let config = Config::offline_from_env().unwrap();
        assert_eq!(config.bot_token.expose_secret(), OFFLINE_TOKEN);
    }
}
