//! Gateway HTTP server (single port).

use crate::brands::{default_rules, BrandId};
use crate::channels::{TelegramClient, TelegramUpdate};
use crate::config::Config;
use crate::notify::{DiscordNotifier, Notifier};
use crate::relay::Relay;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Path Telegram POSTs updates to.
pub const WEBHOOK_PATH: &str = "/webhook/telegram";

const HEALTH_PATH: &str = "/health";

const SERVICE_NAME: &str = "Porter Plays Telegram-Discord Webhook";

const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared state for the gateway: read-only config and the relay pipeline.
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<Config>,
    pub relay: Arc<Relay>,
}

/// Build state with the built-in brand rules and a notifier of the caller's choice.
pub fn build_state_with_notifier(config: Config, notifier: Arc<dyn Notifier>) -> RelayState {
    let relay = Relay::new(
        default_rules(),
        config.channels.telegram.allowed_chats.clone(),
        notifier,
    );
    RelayState {
        config: Arc::new(config),
        relay: Arc::new(relay),
    }
}

/// Build state that posts to the Discord webhooks in `config`.
pub fn build_state(config: Config) -> Result<RelayState> {
    let notifier = Arc::new(
        DiscordNotifier::new(&config.discord).context("building discord webhook client")?,
    );
    Ok(build_state_with_notifier(config, notifier))
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route(HEALTH_PATH, get(health_http))
        .route(WEBHOOK_PATH, post(telegram_webhook))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// When a Telegram token and webhook URL are configured, registers the webhook first and
/// removes it again on shutdown. Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    log_configuration(&config);
    let state = build_state(config.clone())?;

    let telegram_webhook: Option<TelegramClient> = match (
        config.channels.telegram.bot_token.as_deref(),
        config.channels.telegram.webhook_url.as_deref(),
    ) {
        (Some(token), Some(url)) => {
            let telegram = TelegramClient::new(token, None);
            let secret = config.channels.telegram.webhook_secret.as_deref();
            match telegram.set_webhook(url, secret).await {
                Ok(()) => {
                    log::info!("telegram webhook registered: {}", url);
                    Some(telegram)
                }
                Err(e) => {
                    log::warn!("telegram set_webhook failed: {}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("relay listening on {}", bind_addr);
    log::info!("telegram webhook: http://{}{}", bind_addr, WEBHOOK_PATH);
    log::info!("health check: http://{}{}", bind_addr, HEALTH_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(telegram_webhook))
        .await
        .context("gateway server exited")?;
    log::info!("relay stopped");
    Ok(())
}

fn configured(flag: bool) -> &'static str {
    if flag {
        "configured"
    } else {
        "missing"
    }
}

fn log_configuration(config: &Config) {
    let telegram = &config.channels.telegram;
    log::info!("telegram bot: {}", configured(telegram.bot_token.is_some()));
    for brand in BrandId::ALL {
        log::info!(
            "discord webhook {}: {}",
            brand,
            configured(config.discord.webhook_for(brand).is_some())
        );
    }
    if telegram.allowed_chats.is_empty() {
        log::info!("allowed chats: all chats allowed");
    } else {
        log::info!("allowed chats: {}", telegram.allowed_chats.join(", "));
    }
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// Removes the Telegram webhook if this process registered it.
async fn shutdown_signal(telegram_webhook: Option<TelegramClient>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");

    if let Some(t) = telegram_webhook {
        if let Err(e) = t.delete_webhook().await {
            log::debug!("telegram delete_webhook on shutdown: {}", e);
        }
    }
}

/// POST /webhook/telegram — receives Telegram update JSON, verifies the optional secret and
/// runs the relay. Always 200 unless the secret is wrong (403) or processing blew up (500).
async fn telegram_webhook(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if let Some(ref expected) = state.config.channels.telegram.webhook_secret {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != expected.as_str() {
            return (StatusCode::FORBIDDEN, "Forbidden");
        }
    }
    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            log::warn!("ignoring malformed telegram update: {}", e);
            return (StatusCode::OK, "OK");
        }
    };
    let Some(post) = update.into_post() else {
        return (StatusCode::OK, "OK");
    };
    log::debug!("telegram {} received", post.kind());
    let inbound = post.into_inbound();

    // Run on its own task so a panic inside processing becomes a 500 instead of a dropped connection.
    let relay = state.relay.clone();
    match tokio::spawn(async move { relay.handle(&inbound).await }).await {
        Ok(outcome) => {
            log::debug!("relay outcome: {:?}", outcome);
            (StatusCode::OK, "OK")
        }
        Err(e) => {
            log::error!("error processing webhook: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// GET /health returns health JSON with per-brand webhook status (for probes).
async fn health_http(State(state): State<RelayState>) -> Json<serde_json::Value> {
    let notifier = state.relay.notifier();
    let webhooks: serde_json::Map<String, serde_json::Value> = BrandId::ALL
        .iter()
        .map(|b| (b.as_str().to_string(), json!(notifier.has_endpoint(*b))))
        .collect();
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "webhooks": webhooks,
    }))
}

/// GET / describes the service and its endpoints.
async fn service_info() -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "webhook": WEBHOOK_PATH,
            "health": HEALTH_PATH,
        }
    }))
}
