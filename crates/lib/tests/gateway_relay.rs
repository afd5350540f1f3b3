//! Integration tests: run the relay over real HTTP against a mock Discord webhook.
//! Does not require Telegram or Discord. Server tasks are left running when a test ends.

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use lib::brands::{BrandId, BrandRule};
use lib::config::Config;
use lib::gateway;
use lib::notify::{Delivery, Notifier, NotifyError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn capture(
    State(tx): State<mpsc::UnboundedSender<serde_json::Value>>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let _ = tx.send(body);
    StatusCode::NO_CONTENT
}

/// Mock Discord: `/ok` records bodies, `/broken` always answers 500, `/hang` never answers.
async fn mock_discord() -> (SocketAddr, mpsc::UnboundedReceiver<serde_json::Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/ok", post(capture))
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "nope") }),
        )
        .route(
            "/hang",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                StatusCode::NO_CONTENT
            }),
        )
        .with_state(tx);
    (serve(app).await, rx)
}

async fn relay_with(config: Config) -> String {
    let state = gateway::build_state(config).expect("build relay state");
    let addr = serve(gateway::router(state)).await;
    format!("http://{}{}", addr, gateway::WEBHOOK_PATH)
}

/// Notifier that panics mid-delivery.
struct Exploding;

#[async_trait]
impl Notifier for Exploding {
    fn has_endpoint(&self, _brand: BrandId) -> bool {
        true
    }

    async fn notify(
        &self,
        _rule: &BrandRule,
        _text: &str,
        _codes: &[String],
    ) -> Result<Delivery, NotifyError> {
        panic!("notifier blew up");
    }
}

fn update(text: &str, chat_id: i64) -> serde_json::Value {
    serde_json::json!({
        "update_id": 1,
        "channel_post": { "chat": { "id": chat_id, "title": "Porter Codes" }, "text": text }
    })
}

#[tokio::test]
async fn gateway_health_http_reports_webhooks() {
    let port = free_port();
    let mut config = Config::default();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();
    config
        .discord
        .webhooks
        .insert(BrandId::Shuffle, "https://example.test/shuffle".to_string());

    let gateway_handle = tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let url = format!("http://127.0.0.1:{}/health", port);
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let json: serde_json::Value = resp.json().await.expect("parse JSON");
                assert_eq!(json["status"], "healthy");
                assert_eq!(json["webhooks"]["thrill"], false);
                assert_eq!(json["webhooks"]["shuffle"], true);
                assert_eq!(json["webhooks"]["goated"], false);
                assert!(json["timestamp"].is_string());

                let info: serde_json::Value = client
                    .get(format!("http://127.0.0.1:{}/", port))
                    .send()
                    .await
                    .expect("GET /")
                    .json()
                    .await
                    .expect("parse JSON");
                assert_eq!(info["endpoints"]["webhook"], gateway::WEBHOOK_PATH);
                return;
            }
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    gateway_handle.abort();
    panic!(
        "GET {} did not return 200 with health JSON within 5s; last error: {:?}",
        url, last_err
    );
}

#[tokio::test]
async fn brand_message_is_posted_as_embed() {
    let (discord, mut rx) = mock_discord().await;
    let mut config = Config::default();
    config
        .discord
        .webhooks
        .insert(BrandId::Goated, format!("http://{}/ok", discord));
    let url = relay_with(config).await;
    let client = reqwest::Client::new();

    let text = "GOATED community code PLAYGOATED and DISCORD";
    let resp = client.post(&url).json(&update(text, -100)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");

    let body = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("discord webhook called")
        .expect("body");
    let embed = &body["embeds"][0];
    assert_eq!(embed["title"], "🐐 New Goated Codes Alert!");
    assert_eq!(embed["description"], text);
    assert_eq!(embed["color"], 0xFF6B35);
    assert_eq!(
        embed["fields"][0]["value"],
        "`GOATED`\n`PLAYGOATED`\n`DISCORD`"
    );
    assert_eq!(body["username"], "Porter Plays Bot");
}

#[tokio::test]
async fn non_brand_and_malformed_updates_are_acknowledged_silently() {
    let (discord, mut rx) = mock_discord().await;
    let mut config = Config::default();
    for brand in BrandId::ALL {
        config
            .discord
            .webhooks
            .insert(brand, format!("http://{}/ok", discord));
    }
    let url = relay_with(config).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(&url)
        .json(&update("Just a regular message with CODE123", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(&url)
        .json(&serde_json::json!({ "update_id": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let got = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(got.is_err(), "no notification expected, got {:?}", got);
}

#[tokio::test]
async fn delivery_failure_still_acknowledges() {
    let (discord, _rx) = mock_discord().await;
    let mut config = Config::default();
    config
        .discord
        .webhooks
        .insert(BrandId::Thrill, format!("http://{}/broken", discord));
    let url = relay_with(config).await;

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&update("New THRILL bonus code: PORTERVIP", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn stalled_webhook_times_out_and_still_acknowledges() {
    let (discord, _rx) = mock_discord().await;
    let mut config = Config::default();
    config.discord.timeout_ms = 200;
    config
        .discord
        .webhooks
        .insert(BrandId::Shuffle, format!("http://{}/hang", discord));
    let url = relay_with(config).await;

    let resp = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
        .post(&url)
        .json(&update("shuffle PLAYSHUFFLE", 1))
        .send()
        .await
        .expect("inbound request answered before the client gave up");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn processing_panic_is_internal_server_error() {
    let state = gateway::build_state_with_notifier(Config::default(), Arc::new(Exploding));
    let addr = serve(gateway::router(state)).await;
    let url = format!("http://{}{}", addr, gateway::WEBHOOK_PATH);
    let client = reqwest::Client::new();

    let resp = client
        .post(&url)
        .json(&update("GOATED code PLAYGOATED", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.text().await.unwrap(), "Internal Server Error");

    // Non-brand messages never reach the notifier.
    let resp = client
        .post(&url)
        .json(&update("nothing to see", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn disallowed_chat_is_ignored() {
    let (discord, mut rx) = mock_discord().await;
    let mut config = Config::default();
    config.channels.telegram.allowed_chats = vec!["-1001".to_string()];
    config
        .discord
        .webhooks
        .insert(BrandId::Thrill, format!("http://{}/ok", discord));
    let url = relay_with(config).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(&url)
        .json(&update("thrill PORTERVIP", 42))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let got = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(got.is_err());

    client
        .post(&url)
        .json(&update("thrill PORTERVIP", -1001))
        .send()
        .await
        .unwrap();
    let body = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("discord webhook called")
        .expect("body");
    assert_eq!(body["embeds"][0]["fields"][0]["value"], "`PORTERVIP`");
}

#[tokio::test]
async fn wrong_secret_is_forbidden() {
    let mut config = Config::default();
    config.channels.telegram.webhook_secret = Some("s3cret".to_string());
    let url = relay_with(config).await;
    let client = reqwest::Client::new();

    let resp = client.post(&url).json(&update("hi", 1)).send().await.unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .post(&url)
        .header("X-Telegram-Bot-Api-Secret-Token", "s3cret")
        .json(&update("hi", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
