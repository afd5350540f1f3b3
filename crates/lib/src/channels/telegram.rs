//! Telegram channel: webhook update payloads and Bot API webhook management.

use crate::channels::inbound::InboundMessage;
use serde::Deserialize;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Title used when a chat has none (private chats).
pub const DEFAULT_CHAT_TITLE: &str = "Direct Message";

/// Update kinds the relay asks Telegram to deliver.
const ALLOWED_UPDATES: [&str; 2] = ["message", "channel_post"];

/// Telegram update payload (webhook POST body).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub channel_post: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// The part of an update the relay cares about. A regular message wins over a channel post
/// when (unusually) both are present.
#[derive(Debug)]
pub enum TelegramPost {
    Message(TelegramMessage),
    ChannelPost(TelegramMessage),
}

impl TelegramUpdate {
    /// Pick the post carried by this update, if any.
    pub fn into_post(self) -> Option<TelegramPost> {
        match (self.message, self.channel_post) {
            (Some(m), _) => Some(TelegramPost::Message(m)),
            (None, Some(p)) => Some(TelegramPost::ChannelPost(p)),
            (None, None) => None,
        }
    }
}

impl TelegramPost {
    pub fn kind(&self) -> &'static str {
        match self {
            TelegramPost::Message(_) => "message",
            TelegramPost::ChannelPost(_) => "channel_post",
        }
    }

    /// Normalize to an [`InboundMessage`]: text, else caption, else empty.
    pub fn into_inbound(self) -> InboundMessage {
        let msg = match self {
            TelegramPost::Message(m) | TelegramPost::ChannelPost(m) => m,
        };
        let text = msg
            .text
            .filter(|t| !t.is_empty())
            .or(msg.caption)
            .unwrap_or_default();
        InboundMessage {
            text,
            source_chat_id: msg.chat.id.to_string(),
            source_chat_title: msg
                .chat
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

/// Subset of getWebhookInfo.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pending_update_count: u64,
    #[serde(default)]
    pub last_error_date: Option<i64>,
    #[serde(default)]
    pub last_error_message: Option<String>,
}

/// Bot API client for webhook registration (setWebhook, getWebhookInfo, deleteWebhook).
#[derive(Clone)]
pub struct TelegramClient {
    token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, api_base: Option<String>) -> Self {
        Self {
            token: token.into(),
            api_base: api_base
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(telegram_api_base),
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Set webhook URL (and optional secret). Telegram then POSTs updates to the URL.
    /// Pending updates are dropped; only messages and channel posts are requested.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), String> {
        let mut body = serde_json::json!({
            "url": url,
            "drop_pending_updates": true,
            "allowed_updates": ALLOWED_UPDATES,
        });
        if let Some(s) = secret {
            body["secret_token"] = serde_json::Value::String(s.to_string());
        }
        let res = self
            .client
            .post(self.method_url("setWebhook"))
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        check_api_response::<bool>(res, "setWebhook").await.map(|_| ())
    }

    /// Current webhook status.
    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, String> {
        let res = self
            .client
            .get(self.method_url("getWebhookInfo"))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        check_api_response::<WebhookInfo>(res, "getWebhookInfo")
            .await?
            .ok_or_else(|| "getWebhookInfo returned no result".to_string())
    }

    /// Remove the webhook.
    pub async fn delete_webhook(&self) -> Result<(), String> {
        let res = self
            .client
            .post(self.method_url("deleteWebhook"))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        check_api_response::<bool>(res, "deleteWebhook").await.map(|_| ())
    }
}

async fn check_api_response<T: serde::de::DeserializeOwned>(
    res: reqwest::Response,
    method: &str,
) -> Result<Option<T>, String> {
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(format!("{} failed: {} {}", method, status, body));
    }
    let data: ApiResponse<T> = res.json().await.map_err(|e| e.to_string())?;
    if !data.ok {
        return Err(format!(
            "{} returned ok: false ({})",
            method,
            data.description.unwrap_or_default()
        ));
    }
    Ok(data.result)
}

/// Resolve Telegram bot API base URL (for tests or custom endpoints).
pub fn telegram_api_base() -> String {
    std::env::var("TELEGRAM_API_BASE")
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| TELEGRAM_API_BASE.to_string())
}
