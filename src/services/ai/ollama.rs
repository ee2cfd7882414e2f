use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{LlmProvider, Message};

/// Local Ollama instance, used when no Gemini key is configured.
pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let chat_messages: Vec<serde_json::Value> = std::iter::once(json!({
            "role": "system",
            "content": system_prompt,
        }))
        .chain(messages.iter().map(|msg| {
            json!({
                "role": msg.role,
                "content": msg.content,
            })
        }))
        .collect();

        let body = json!({
            "model": self.model,
            "messages": chat_messages,
            "stream": false,
        });

        let resp = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .context("failed to reach Ollama")?;

        let status = resp.status();
        let data: serde_json::Value =
            resp.json().await.context("failed to parse Ollama response")?;

        if !status.is_success() {
            anyhow::bail!("Ollama error ({}): {}", status, data);
        }

        data["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in Ollama response"))
    }
}
