//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.porter-relay/config.json`), then environment
//! variables override individual fields. Loaded once at startup and read-only afterwards.

use crate::brands::BrandId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (e.g. Telegram).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Discord webhooks and bot identity.
    #[serde(default)]
    pub discord: DiscordConfig,
}

/// HTTP bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port (default 3000). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; Telegram must be able to reach the webhook).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramChannelConfig,
}

/// Telegram channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannelConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// When set (and a token is configured), `serve` registers this webhook URL on startup and removes it on shutdown. Overridden by TELEGRAM_WEBHOOK_URL.
    pub webhook_url: Option<String>,
    /// Optional secret checked against X-Telegram-Bot-Api-Secret-Token. Overridden by TELEGRAM_WEBHOOK_SECRET.
    pub webhook_secret: Option<String>,
    /// Chat ids allowed to trigger alerts. Empty = all chats. Overridden by ALLOWED_TELEGRAM_CHANNELS (comma-separated).
    #[serde(default)]
    pub allowed_chats: Vec<String>,
}

/// Discord webhook targets and the identity used when posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    /// Brand → webhook URL. Overridden per brand by DISCORD_WEBHOOK_<BRAND>.
    #[serde(default)]
    pub webhooks: BTreeMap<BrandId, String>,
    #[serde(default = "default_discord_username")]
    pub username: String,
    #[serde(default = "default_discord_avatar_url")]
    pub avatar_url: String,
    #[serde(default = "default_discord_footer")]
    pub footer: String,
    /// Per-delivery timeout in milliseconds (default 10000). A stalled webhook counts as a failed delivery.
    #[serde(default = "default_discord_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_discord_username() -> String {
    "Porter Plays Bot".to_string()
}

fn default_discord_avatar_url() -> String {
    "https://jmenichole.github.io/porter-plays-leaderboard/Porterplayslogo.png".to_string()
}

fn default_discord_footer() -> String {
    "Porter Plays - Telegram Monitor".to_string()
}

fn default_discord_timeout_ms() -> u64 {
    10_000
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhooks: BTreeMap::new(),
            username: default_discord_username(),
            avatar_url: default_discord_avatar_url(),
            footer: default_discord_footer(),
            timeout_ms: default_discord_timeout_ms(),
        }
    }
}

impl DiscordConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured, non-blank webhook URL for a brand.
    pub fn webhook_for(&self, brand: BrandId) -> Option<&str> {
        self.webhooks
            .get(&brand)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Split a comma-separated chat id list, trimming blanks.
pub fn parse_allowed_chats(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply environment overrides using `lookup` (blank values are ignored).
pub fn apply_env_overrides_with<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    if let Some(port) = get("PORT") {
        config.gateway.port = port
            .parse()
            .with_context(|| format!("invalid PORT value: {}", port))?;
    }
    let telegram = &mut config.channels.telegram;
    if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
        telegram.bot_token = Some(token);
    }
    if let Some(url) = get("TELEGRAM_WEBHOOK_URL") {
        telegram.webhook_url = Some(url);
    }
    if let Some(secret) = get("TELEGRAM_WEBHOOK_SECRET") {
        telegram.webhook_secret = Some(secret);
    }
    if let Some(list) = get("ALLOWED_TELEGRAM_CHANNELS") {
        telegram.allowed_chats = parse_allowed_chats(&list);
    }
    for brand in BrandId::ALL {
        if let Some(url) = get(brand.webhook_env_var()) {
            config.discord.webhooks.insert(brand, url);
        }
    }
    Ok(())
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_env_overrides_with(config, |key| std::env::var(key).ok())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("PORTER_RELAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".porter-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default path), then apply env overrides.
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config)?;
    Ok((config, path))
}
