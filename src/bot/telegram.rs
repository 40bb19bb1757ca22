//! Minimal Telegram Bot API client: long polling, text replies, documents.
//!
//! Only the three methods the bot needs are wrapped. Every call goes to
//! `<api_base_url>/bot<token>/<method>` and the JSON envelope
//! `{ "ok": bool, "result": ..., "description": ... }` is unwrapped here.

use super::{BotConfig, BotError};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Upload/replies timeout. Long polls add their own poll timeout on top.
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Client bound to one bot token.
pub struct TelegramClient {
    http: reqwest::Client,
    /// `<api_base_url>/bot<token>`. Errors are stripped of their URL so the
    /// token never reaches logs or chat replies.
    endpoint: String,
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self, BotError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| BotError::Request {
                method: "client".into(),
                reason: e.without_url().to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: format!(
                "{}/bot{}",
                config.api_base_url.trim_end_matches('/'),
                config.token
            ),
        })
    }

    /// Long-poll for updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, BotError> {
        let request = self
            .http
            .post(self.url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs + 10))
            .json(&json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }));
        self.call("getUpdates", request).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let request = self
            .http
            .post(self.url("sendMessage"))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&json!({ "chat_id": chat_id, "text": text }));
        self.call::<serde_json::Value>("sendMessage", request).await?;
        Ok(())
    }

    /// Upload the file at `path` as a document attachment.
    pub async fn send_document(&self, chat_id: i64, path: &Path) -> Result<(), BotError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| BotError::ReadDocument {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| BotError::Request {
                method: "sendDocument".into(),
                reason: e.to_string(),
            })?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let request = self
            .http
            .post(self.url("sendDocument"))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .multipart(form);
        self.call::<serde_json::Value>("sendDocument", request).await?;
        Ok(())
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BotError> {
        let request_failed = |reason: String| BotError::Request {
            method: method.to_string(),
            reason,
        };

        let response = request
            .send()
            .await
            .map_err(|e| request_failed(e.without_url().to_string()))?;
        let status = response.status();
        // Telegram reports API errors as JSON with a non-2xx status; read the
        // envelope either way and fall back to the status when it's missing.
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| {
                request_failed(format!("HTTP {}: {}", status.as_u16(), e.without_url()))
            })?;

        debug!("{} → HTTP {}", method, status.as_u16());
        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(BotError::Api {
                method: method.to_string(),
                description: description.unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            }),
        }
    }
}
