//! Inbound message from a channel: delivered to the relay pipeline for classification.

/// A normalized chat message, independent of the channel it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub text: String,
    pub source_chat_id: String,
    pub source_chat_title: String,
}
