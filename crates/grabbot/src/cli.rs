//! Command-line interface.

use clap::{Parser, Subcommand};
use grabcore::QualityLabel;

#[derive(Parser, Debug)]
#[command(name = "grabbot", version, about = "Telegram bot that downloads YouTube videos and audio")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run,

    /// Print the title and offered qualities of a link
    Probe {
        /// YouTube link
        url: String,
    },

    /// Download a link into the download directory without Telegram
    Download {
        /// YouTube link
        url: String,

        /// Extract MP3 audio instead of video
        #[arg(long, conflicts_with = "quality")]
        audio: bool,

        /// Video quality, e.g. 720p
        #[arg(long, short, default_value = "720p")]
        quality: QualityLabel,

        /// Keep the file instead of deleting it after reporting
        #[arg(long)]
        keep: bool,
    },

    /// Print the yt-dlp version in use
    YtdlpVersion,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run; no subcommand means `run`.
    pub fn resolved_command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Run)
    }
}
