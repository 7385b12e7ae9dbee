use std::fmt;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Who a message came from. Used as the rate-limit and whitelist key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatIdentity {
    pub chat_id: ChatId,
    pub display_name: String,
    pub sender_username: Option<String>,
}

/// Where the translatable text was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextSource {
    Text,
    Caption,
}

impl TextSource {
    pub fn as_str(self) -> &'static str {
        match self {
            TextSource::Text => "TEXT",
            TextSource::Caption => "CAPTION",
        }
    }
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat: ChatIdentity,
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub text: String,
    pub source: TextSource,
    pub is_command: bool,
}

impl IncomingMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.chat_id,
            message_id: self.message_id,
        }
    }
}

/// Per-message correlation id, threaded explicitly through every call and log line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(hex[..8].to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
