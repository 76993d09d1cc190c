use super::traits::Channel;
use crate::identity::ChatId;
use async_trait::async_trait;
use std::sync::Arc;

/// Pushes unsolicited messages (scheduled-run results) to an operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat: ChatId, text: &str) -> anyhow::Result<()>;
}

/// [`Notifier`] backed by a chat [`Channel`].
pub struct ChannelNotifier {
    channel: Arc<dyn Channel>,
}

impl ChannelNotifier {
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        self.channel.send_chunked(text, &chat.to_string()).await
    }
}
