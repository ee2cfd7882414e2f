pub mod telegram;

use async_trait::async_trait;

/// Outbound side of the chat transport: exactly one reply per inbound
/// message.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;
}
