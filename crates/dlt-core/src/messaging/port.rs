use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{MessagingCapabilities, OutgoingReply},
    Result,
};

/// Transport port used by the pipeline and the admin command.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Send HTML that replies to (quotes) an earlier message.
    async fn send_reply(&self, reply: OutgoingReply) -> Result<MessageRef>;

    /// Send plain text to a chat.
    async fn send_text(&self, chat_id: ChatId, text: &str, silent: bool) -> Result<MessageRef>;
}
