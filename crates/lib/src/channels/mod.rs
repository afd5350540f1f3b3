//! Communication channels (e.g. Telegram).
//!
//! Channels turn provider-specific payloads into [`InboundMessage`]s for the relay,
//! and expose whatever management API the provider needs (webhook registration).

mod inbound;
mod telegram;

pub use inbound::InboundMessage;
pub use telegram::{
    telegram_api_base, TelegramChat, TelegramClient, TelegramMessage, TelegramPost,
    TelegramUpdate, WebhookInfo, DEFAULT_CHAT_TITLE,
};
