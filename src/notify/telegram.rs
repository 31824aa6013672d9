//! Telegram Bot API notifier.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Notifier;
use crate::config::TelegramConfig;
use crate::{NewsgrabError, Result};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends notifications as bot messages via `sendMessage`.
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramNotifier {
    /// Create a notifier from configuration and a shared HTTP client.
    pub fn new(config: &TelegramConfig, client: Client) -> Self {
        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client,
            base_url,
            token: config.token.clone(),
        }
    }

    /// Endpoint for `sendMessage`.
    pub fn send_message_url(&self) -> String {
        format!("{}bot{}/sendMessage", self.base_url, self.token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, destination: &str, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: destination,
            text,
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NewsgrabError::Notify(format!("telegram request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| NewsgrabError::Notify(format!("failed to read telegram reply: {}", e)))?;

        check_reply(status, &body)?;
        debug!(chat_id = destination, "notification delivered");
        Ok(())
    }
}

/// Interpret a `sendMessage` reply.
fn check_reply(status: StatusCode, body: &[u8]) -> Result<()> {
    let reply: Option<ApiReply> = serde_json::from_slice(body).ok();

    if !status.is_success() {
        let detail = reply
            .and_then(|r| r.description)
            .unwrap_or_else(|| status.to_string());
        return Err(NewsgrabError::Notify(format!(
            "telegram returned {}: {}",
            status.as_u16(),
            detail
        )));
    }

    match reply {
        Some(ApiReply { ok: true, .. }) => Ok(()),
        Some(ApiReply { description, .. }) => Err(NewsgrabError::Notify(format!(
            "telegram rejected message: {}",
            description.unwrap_or_else(|| "no description".to_string())
        ))),
        None => Err(NewsgrabError::Notify(
            "malformed telegram reply".to_string(),
        )),
    }
}
