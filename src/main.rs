//! Ordercast webhook gateway service.
//!
//! Main entry point: loads configuration, initializes tracing, wires the
//! shipped handler set to its collaborators, and serves the ingestion
//! pipeline until shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use ordercast_core::RealClock;
use ordercast_gateway::{AppState, Config, ReplayGuard, WebhookPipeline};
use ordercast_notify::{
    handler_registry, HttpMailer, HttpOrderSource, MailerConfig, StorefrontConfig,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting Ordercast webhook gateway");

    let config = Config::load()?;
    info!(
        signature_header = %config.signature_header,
        replay_tolerance_seconds = config.replay_tolerance_seconds,
        replay_policy = ?config.replay_policy(),
        secret_configured = config.webhook_secret.is_some(),
        "Configuration loaded"
    );

    if config.webhook_secret.is_none() {
        warn!("No webhook secret configured; every delivery will be rejected with 500");
    }

    let registry = build_handler_registry(&config)?;
    info!(handlers = registry.len(), "Handler table wired");

    let replay = ReplayGuard::new(Arc::new(RealClock::new()))
        .with_tolerance(config.replay_tolerance())
        .with_policy(config.replay_policy());

    let pipeline =
        Arc::new(WebhookPipeline::new(config.webhook_secret.clone(), replay, registry));
    let state = AppState::new(pipeline, config.signature_header.clone());

    let addr = config.parse_server_addr()?;
    info!(addr = %addr, "Ordercast is ready to receive webhooks");

    ordercast_gateway::start_server(
        state,
        addr,
        std::time::Duration::from_secs(config.request_timeout),
    )
    .await
    .context("HTTP server failed")?;

    info!("Ordercast shutdown complete");
    Ok(())
}

/// Wires the shipped order handlers to their outbound collaborators.
fn build_handler_registry(config: &Config) -> Result<ordercast_core::HandlerRegistry> {
    let storefront_url = config
        .storefront_api_url
        .clone()
        .context("STOREFRONT_API_URL is required to wire the order handlers")?;
    let storefront_token = config
        .storefront_api_token
        .clone()
        .context("STOREFRONT_API_TOKEN is required to wire the order handlers")?;
    let mailer_url = config
        .mailer_api_url
        .clone()
        .context("MAILER_API_URL is required to wire the order handlers")?;
    let mailer_token = config
        .mailer_api_token
        .clone()
        .context("MAILER_API_TOKEN is required to wire the order handlers")?;

    let source = HttpOrderSource::new(StorefrontConfig::new(storefront_url, storefront_token))
        .context("Failed to build storefront client")?;
    let mailer = HttpMailer::new(MailerConfig::new(
        mailer_url,
        mailer_token,
        config.mailer_from.clone(),
    ))
    .context("Failed to build mailer client")?;

    Ok(handler_registry(Arc::new(source), Arc::new(mailer)))
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,ordercast=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
