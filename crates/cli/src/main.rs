use clap::{Parser, Subcommand};
use lib::brands::default_rules;
use lib::channels::TelegramClient;
use lib::classify::classify;

#[derive(Parser)]
#[command(name = "porter-relay")]
#[command(about = "Porter Plays Telegram → Discord promo-code relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the relay HTTP server (Telegram webhook endpoint, /health, /).
    Serve {
        /// Config file path (default: PORTER_RELAY_CONFIG or ~/.porter-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from PORT, config, or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Classify a message locally and print the detected brand and codes as JSON.
    Classify {
        /// Message text
        text: String,
    },

    /// Manage the Telegram bot webhook (uses TELEGRAM_BOT_TOKEN or the config bot token).
    Webhook {
        /// Config file path (default: PORTER_RELAY_CONFIG or ~/.porter-relay/config.json)
        #[arg(long, short, value_name = "PATH", global = true)]
        config: Option<std::path::PathBuf>,

        #[command(subcommand)]
        action: WebhookAction,
    },
}

#[derive(Subcommand)]
enum WebhookAction {
    /// Point the bot at a webhook URL (e.g. https://your-server.com/webhook/telegram).
    Set {
        url: String,
    },
    /// Show the current webhook status.
    Info,
    /// Remove the webhook.
    Delete,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("porter-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Classify { text }) => {
            if let Err(e) = run_classify(&text) {
                log::error!("classify failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Webhook { config, action }) => {
            if let Err(e) = run_webhook(config, action).await {
                log::error!("webhook failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting relay on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

fn run_classify(text: &str) -> anyhow::Result<()> {
    let result = classify(text, &default_rules());
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_webhook(
    config_path: Option<std::path::PathBuf>,
    action: WebhookAction,
) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let telegram = &config.channels.telegram;
    let Some(token) = telegram.bot_token.as_deref() else {
        anyhow::bail!("telegram bot token not configured (set TELEGRAM_BOT_TOKEN)");
    };
    let client = TelegramClient::new(token, None);

    match action {
        WebhookAction::Set { url } => {
            println!("setting telegram webhook: {}", url);
            client
                .set_webhook(&url, telegram.webhook_secret.as_deref())
                .await
                .map_err(anyhow::Error::msg)?;
            println!("webhook set");
            print_webhook_info(&client).await
        }
        WebhookAction::Info => print_webhook_info(&client).await,
        WebhookAction::Delete => {
            client.delete_webhook().await.map_err(anyhow::Error::msg)?;
            println!("webhook deleted");
            Ok(())
        }
    }
}

async fn print_webhook_info(client: &TelegramClient) -> anyhow::Result<()> {
    let info = client
        .get_webhook_info()
        .await
        .map_err(anyhow::Error::msg)?;
    println!(
        "url: {}",
        if info.url.is_empty() { "not set" } else { info.url.as_str() }
    );
    println!("pending updates: {}", info.pending_update_count);
    match (info.last_error_date, info.last_error_message) {
        (Some(_), Some(msg)) => println!("last error: {}", msg),
        (Some(date), None) => println!("last error at unix time {}", date),
        _ => println!("status: working"),
    }
    Ok(())
}
