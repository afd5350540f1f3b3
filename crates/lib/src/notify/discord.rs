//! Discord webhook notifier: formats a brand alert embed and POSTs it to the brand's webhook.

use crate::brands::{BrandId, BrandRule};
use crate::config::DiscordConfig;
use crate::notify::{Delivery, Notifier, NotifyError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const CODES_FIELD_NAME: &str = "🎁 Detected Codes";

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("discord request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("discord api error: {0}")]
    Api(String),
}

/// Body of a Discord webhook execute request.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
    pub username: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Build the alert payload. Codes are listed one per line in backticks; no field when there are none.
pub fn format_payload(
    rule: &BrandRule,
    text: &str,
    codes: &[String],
    identity: &DiscordConfig,
    at: DateTime<Utc>,
) -> WebhookPayload {
    let fields = if codes.is_empty() {
        Vec::new()
    } else {
        vec![EmbedField {
            name: CODES_FIELD_NAME.to_string(),
            value: codes
                .iter()
                .map(|c| format!("`{}`", c))
                .collect::<Vec<_>>()
                .join("\n"),
            inline: false,
        }]
    };
    WebhookPayload {
        embeds: vec![Embed {
            title: format!("{} New {} Alert!", rule.icon, rule.display_name),
            description: text.to_string(),
            color: rule.color,
            fields,
            footer: EmbedFooter {
                text: identity.footer.clone(),
            },
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }],
        username: identity.username.clone(),
        avatar_url: identity.avatar_url.clone(),
    }
}

/// Posts alerts to per-brand Discord webhooks.
#[derive(Clone)]
pub struct DiscordNotifier {
    webhooks: BTreeMap<BrandId, String>,
    identity: DiscordConfig,
    client: reqwest::Client,
}

impl DiscordNotifier {
    /// Build a notifier whose deliveries give up after `config.timeout()`.
    pub fn new(config: &DiscordConfig) -> Result<Self, DiscordError> {
        let webhooks = config
            .webhooks
            .iter()
            .map(|(brand, url)| (*brand, url.trim().to_string()))
            .filter(|(_, url)| !url.is_empty())
            .collect();
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            webhooks,
            identity: config.clone(),
            client,
        })
    }

    async fn post(&self, url: &str, payload: &WebhookPayload) -> Result<(), DiscordError> {
        let res = self.client.post(url).json(payload).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DiscordError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn has_endpoint(&self, brand: BrandId) -> bool {
        self.webhooks.contains_key(&brand)
    }

    async fn notify(
        &self,
        rule: &BrandRule,
        text: &str,
        codes: &[String],
    ) -> Result<Delivery, NotifyError> {
        let Some(url) = self.webhooks.get(&rule.brand) else {
            return Ok(Delivery::NoEndpoint);
        };
        let payload = format_payload(rule, text, codes, &self.identity, Utc::now());
        self.post(url, &payload).await?;
        Ok(Delivery::Sent)
    }
}
