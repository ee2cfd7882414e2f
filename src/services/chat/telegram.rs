use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::ChatTransport;

pub struct TelegramBot {
    token: String,
    client: reqwest::Client,
}

impl TelegramBot {
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramBot {
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        self.client
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .context("failed to call Telegram sendMessage")?
            .error_for_status()
            .context("Telegram API returned error")?;

        Ok(())
    }
}
