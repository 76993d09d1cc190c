use crate::identity::ChatId;
use async_trait::async_trait;

/// A text message received from a chat transport.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: String,
    /// Chat the message was posted in; replies go back here.
    pub chat: ChatId,
    pub content: String,
    pub channel: String,
    /// Transport-native id, used to delete the message afterwards.
    pub message_id: Option<String>,
    pub timestamp: u64,
}

/// Core channel trait, implemented per messaging platform.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, message: &str, recipient: &str) -> anyhow::Result<()>;

    /// Receive messages until `tx` is closed (long-running).
    async fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> anyhow::Result<()>;

    async fn health_check(&self) -> bool {
        true
    }

    fn max_message_length(&self) -> usize {
        usize::MAX
    }

    async fn delete_message(&self, _chat_id: &str, _message_id: &str) -> anyhow::Result<()> {
        anyhow::bail!("message deletion not supported by this channel")
    }

    async fn send_chunked(&self, message: &str, recipient: &str) -> anyhow::Result<()> {
        let chunks = super::chunker::chunk_message(message, self.max_message_length());
        for chunk in chunks {
            self.send(&chunk, recipient).await?;
        }
        Ok(())
    }
}
