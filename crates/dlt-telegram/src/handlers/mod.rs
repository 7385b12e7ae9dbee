//! Telegram update handlers.
//!
//! Text and caption messages go through the translation pipeline; `/`-prefixed
//! text is treated as a command.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;
mod translate;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if !translate::is_supported_chat(&msg) {
        return Ok(());
    }

    if let Some(text) = msg.text() {
        if text.trim_start().starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
    }

    translate::handle_translatable(msg, state).await
}
