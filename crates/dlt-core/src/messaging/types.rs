use crate::domain::MessageRef;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingReply {
    pub reply_to: MessageRef,
    pub html: String,
    /// Deliver without a notification sound.
    pub silent: bool,
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_html: bool,
    pub max_message_len: usize,
}
