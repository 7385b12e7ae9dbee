use std::sync::Arc;

use teloxide::prelude::*;

use dlt_core::domain::{ChatId, ChatIdentity, IncomingMessage, MessageId, TextSource, UserId};

use crate::router::AppState;

/// Groups, supergroups and private chats; channels are skipped.
pub(crate) fn is_supported_chat(msg: &Message) -> bool {
    msg.chat.is_private() || msg.chat.is_group() || msg.chat.is_supergroup()
}

/// Map a Telegram message to the pipeline's input. Captions win over text.
pub(crate) fn incoming_from(msg: &Message) -> Option<IncomingMessage> {
    let sender = msg.from()?;
    let (text, source) = match (msg.caption(), msg.text()) {
        (Some(caption), _) => (caption, TextSource::Caption),
        (None, Some(text)) => (text, TextSource::Text),
        (None, None) => return None,
    };

    let display_name = msg
        .chat
        .title()
        .or_else(|| msg.chat.first_name())
        .unwrap_or("Unknown User")
        .trim()
        .to_string();

    Some(IncomingMessage {
        chat: ChatIdentity {
            chat_id: ChatId(msg.chat.id.0),
            display_name,
            sender_username: sender.username.clone(),
        },
        message_id: MessageId(msg.id.0),
        sender_id: UserId(sender.id.0 as i64),
        text: text.to_string(),
        source,
        is_command: text.trim_start().starts_with('/'),
    })
}

pub async fn handle_translatable(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = incoming_from(&msg) else {
        return Ok(());
    };

    let outcome = state.pipeline.process(incoming).await;
    tracing::debug!(chat_id = msg.chat.id.0, outcome = ?outcome, "message processed");
    Ok(())
}
