use std::time::Duration;

/// Core error type for the translation bot.
///
/// Adapter crates map their specific errors into this type. Inside the message
/// pipeline every variant is converted into a local outcome; nothing escapes
/// to the sender.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
