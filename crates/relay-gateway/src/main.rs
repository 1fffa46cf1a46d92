use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use relay_agent::{gemini::GeminiProvider, provider::LlmProvider, Persona, RelayPipeline, ReplyGenerator};
use relay_channels::{Pacing, Segmenter, WaSenderChannel};
use relay_core::RelayConfig;
use relay_history::HistoryStore;

mod app;
mod http;

/// WhatsApp webhook relay: answers inbound messages with Gemini replies.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML config file.
    #[arg(long, env = "RELAY_CONFIG")]
    config: Option<String>,

    /// Listen port (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Bind address (overrides config).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "relay_gateway=info,relay_agent=info,relay_channels=info,relay_history=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = RelayConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        RelayConfig::default()
    });
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }

    let pipeline = build_pipeline(&config).await?;
    let state = Arc::new(app::AppState::new(config, pipeline));
    let router = app::build_router(Arc::clone(&state));

    let addr: SocketAddr =
        format!("{}:{}", state.config.gateway.bind, state.config.gateway.port).parse()?;
    info!(
        webhook = %state.config.gateway.webhook_path,
        "relay gateway listening on {}", addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Wire persona, generator, history store and WhatsApp channel together.
async fn build_pipeline(config: &RelayConfig) -> anyhow::Result<RelayPipeline> {
    let persona = Arc::new(Persona::load(Path::new(&config.agent.persona_path)));

    let provider: Option<Box<dyn LlmProvider>> = match config.agent.api_key.as_deref() {
        Some(key) if !key.is_empty() => {
            info!(model = %config.agent.model, "Gemini provider configured");
            Some(Box::new(GeminiProvider::new(
                key.to_string(),
                Some(config.agent.base_url.clone()),
                Duration::from_secs(config.agent.request_timeout_secs),
            )))
        }
        _ => {
            warn!("no Gemini API key configured; every reply will be an apology");
            None
        }
    };
    let generator = ReplyGenerator::new(provider, persona, config.agent.model.clone());

    let history = HistoryStore::new(&config.history.dir);
    history.init().await?;
    info!(dir = %history.dir().display(), "history store ready");

    let channel = WaSenderChannel::new(
        config.whatsapp.api_url.clone(),
        config.whatsapp.api_token.clone(),
        Duration::from_secs(config.whatsapp.timeout_secs),
    );
    if !channel.has_token() {
        warn!("no WaSender API token configured; replies cannot be delivered");
    }

    let delivery = &config.delivery;
    Ok(RelayPipeline::new(
        generator,
        history,
        Arc::new(channel),
        Segmenter::new(delivery.max_lines, delivery.max_chars_per_line),
        Pacing::from_millis(delivery.min_delay_ms, delivery.max_delay_ms),
    ))
}
