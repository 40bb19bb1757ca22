//! Telegram front end: send the bot an issuu link, get the PDF back.
//!
//! The bot long-polls `getUpdates` and handles every message on its own
//! task. Each download gets a private [`TempDir`] for its output, so
//! concurrent users never share files. The token comes in through
//! [`BotConfig`]; the download pipeline itself never sees it.

pub mod telegram;

use crate::config::FetcherConfig;
use crate::download::{download, output_path_in};
use crate::error::FetchError;
use crate::pipeline::reference::{parse_reference, DocumentReference};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use telegram::{Message, TelegramClient};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use telegram::Update;

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

pub const GREETING: &str = "Send me an Issuu document URL and I'll download the PDF for you!";
pub const INVALID_URL_REPLY: &str = "Please send a valid Issuu document URL.";
pub const DOWNLOADING_REPLY: &str = "Downloading your document, please wait...";

/// Errors of the bot front end. Failed downloads are also reported back to
/// the user in chat.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("TELEGRAM_BOT_TOKEN is not set.\nCreate a bot with @BotFather and export its token.")]
    MissingToken,

    #[error("Telegram request '{method}' failed: {reason}")]
    Request { method: String, reason: String },

    #[error("Telegram API rejected '{method}': {description}")]
    Api { method: String, description: String },

    /// The pipeline failed; shown to the user verbatim.
    #[error(transparent)]
    Download(#[from] FetchError),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bot configuration, built once at startup.
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    /// Default: `https://api.telegram.org`.
    pub api_base_url: String,
    /// Long-poll duration passed to `getUpdates`. Default: 30.
    pub poll_timeout_secs: u64,
    /// Pause after a failed poll before trying again. Default: 5.
    pub poll_interval_secs: u64,
    /// Pipeline settings used for every download.
    pub fetcher: FetcherConfig,
}

impl BotConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            poll_interval_secs: 5,
            fetcher: FetcherConfig::default(),
        }
    }

    /// Read the token from [`TOKEN_ENV`]. Blank values count as missing.
    pub fn from_env() -> Result<Self, BotError> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => Err(BotError::MissingToken),
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("fetcher", &self.fetcher)
            .finish()
    }
}

/// What an incoming text message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// `/start` (optionally `/start@BotName`).
    Start,
    /// Any other command; ignored.
    Command,
    /// Text containing an issuu document link.
    Document(DocumentReference),
    /// Plain text without a usable link.
    NotADocument,
}

/// Classify a message text.
pub fn classify(text: &str) -> Incoming {
    let text = text.trim();
    if let Some(command) = text.strip_prefix('/') {
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("");
        return if name == "start" {
            Incoming::Start
        } else {
            Incoming::Command
        };
    }

    match parse_reference(text) {
        Ok(reference) => Incoming::Document(reference),
        Err(_) => Incoming::NotADocument,
    }
}

/// Poll for updates until Ctrl-C.
pub async fn run(config: BotConfig) -> Result<(), BotError> {
    let client = Arc::new(TelegramClient::new(&config)?);
    let config = Arc::new(config);
    let mut offset = 0i64;

    info!("Bot is running...");
    loop {
        let polled = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down bot");
                return Ok(());
            }
            polled = client.get_updates(offset, config.poll_timeout_secs) => polled,
        };

        match polled {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(message) = update.message else {
                        continue;
                    };
                    let client = Arc::clone(&client);
                    let config = Arc::clone(&config);
                    tokio::spawn(async move {
                        handle_message(&client, &config.fetcher, message).await;
                    });
                }
            }
            Err(e) => {
                warn!("Polling failed: {}", e);
                tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
            }
        }
    }
}

/// React to one message. Failures are logged, never propagated.
pub async fn handle_message(client: &TelegramClient, fetcher: &FetcherConfig, message: Message) {
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let chat_id = message.chat.id;

    let result = match classify(text) {
        Incoming::Start => client.send_message(chat_id, GREETING).await,
        Incoming::Command => {
            debug!("Ignoring command from chat {}: {}", chat_id, text);
            Ok(())
        }
        Incoming::NotADocument => client.send_message(chat_id, INVALID_URL_REPLY).await,
        Incoming::Document(reference) => {
            deliver_document(client, fetcher, chat_id, text.trim(), &reference).await
        }
    };

    if let Err(e) = result {
        error!("Failed to answer chat {}: {}", chat_id, e);
    }
}

async fn deliver_document(
    client: &TelegramClient,
    fetcher: &FetcherConfig,
    chat_id: i64,
    url: &str,
    reference: &DocumentReference,
) -> Result<(), BotError> {
    client.send_message(chat_id, DOWNLOADING_REPLY).await?;
    info!("Chat {} requested {}", chat_id, reference);

    let workdir = match TempDir::new() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Error: {}", e);
            return client
                .send_message(chat_id, &format!("Failed to download: {e}"))
                .await;
        }
    };
    let pdf_path = output_path_in(workdir.path(), reference);

    let sent = match download(url, &pdf_path, fetcher).await {
        Ok(report) => {
            if !report.is_complete() {
                warn!(
                    "{}: {} of {} pages skipped",
                    reference,
                    report.skipped.len(),
                    report.total_pages
                );
            }
            client.send_document(chat_id, &pdf_path).await
        }
        Err(e) => Err(e.into()),
    };

    match sent {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Error: {}", e);
            client
                .send_message(chat_id, &format!("Failed to download: {e}"))
                .await
        }
    }
}
