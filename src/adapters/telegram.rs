//! Operator notifiers
//!
//! [`TelegramNotifier`] posts to the Bot API `sendMessage` endpoint.
//! [`LogNotifier`] is used when alerts are disabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{parse_json, JsonClient};
use crate::ports::{Notifier, SourceError};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub timeout: Duration,
}

pub struct TelegramNotifier {
    config: TelegramConfig,
    http: JsonClient,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, SourceError> {
        if config.bot_token.is_empty() || config.chat_id.is_empty() {
            return Err(SourceError::Config("Telegram bot token and chat id are required".into()));
        }
        let http = JsonClient::new(config.timeout)?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", TELEGRAM_API, self.config.bot_token)
    }
}

pub(crate) fn check_response(body: &str) -> Result<(), SourceError> {
    let response: ApiResponse = parse_json(body)?;
    if response.ok {
        Ok(())
    } else {
        Err(SourceError::Data(
            response.description.unwrap_or_else(|| "sendMessage rejected".to_string()),
        ))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), SourceError> {
        let request = self.http.post(&self.endpoint()).json(&SendMessage {
            chat_id: &self.config.chat_id,
            text: message,
        });
        let body = self.http.send(request).await?;
        check_response(&body)
    }
}

/// Notifier that only writes the message to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), SourceError> {
        tracing::info!("ALERT: {}", message);
        Ok(())
    }
}
