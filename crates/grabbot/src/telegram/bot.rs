//! Bot initialization and command definitions

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use grabcore::core::config::{network, Config};
use grabcore::i18n;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "restart the bot")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "change language")]
    Language,
}

/// Creates a Bot instance with custom or default API URL
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(network::timeout()).build()?;
    let bot = Bot::with_client(config.bot_token.expose_secret(), client);

    Ok(match &config.api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    })
}

/// Registers the command list shown in Telegram clients, per supported language.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    for (code, _) in i18n::SUPPORTED_LANGS {
        let lang = i18n::lang_from_code(code);
        let commands = vec![
            BotCommand::new("start", i18n::t(&lang, "command-start")),
            BotCommand::new("help", i18n::t(&lang, "command-help")),
            BotCommand::new("language", i18n::t(&lang, "command-language")),
        ];

        let request = bot.set_my_commands(commands);
        if *code == i18n::DEFAULT_LANG_CODE {
            request.await?;
        } else {
            request.language_code(code.to_string()).await?;
        }
    }
    Ok(())
}
