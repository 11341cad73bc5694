use location_relay::config::RelayConfig;
use location_relay::services::{
    init_metrics, EmailProvider, SendGridProvider, StaticTokenRegistry, TokenRegistry,
};
use location_relay::startup::Application;
use service_core::observability::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = RelayConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("location-relay", "info", config.otlp_endpoint.as_deref())?;

    init_metrics()?;

    let tokens = match &config.access_tokens {
        Some(list) => StaticTokenRegistry::new(list.iter().cloned()),
        None => {
            tracing::warn!("ACCESS_TOKENS not set, using built-in token set");
            StaticTokenRegistry::builtin()
        }
    };
    if tokens.is_empty() {
        tracing::warn!("No access tokens configured; every link will be rejected");
    }
    tracing::info!(count = tokens.len(), "Token registry loaded");

    let email_provider = SendGridProvider::new(&config.sendgrid).map_err(|e| {
        tracing::error!("Failed to initialize SendGrid provider: {}", e);
        anyhow::anyhow!("Email provider error: {}", e)
    })?;
    tracing::info!("SendGrid email provider initialized");

    let email_provider: Arc<dyn EmailProvider> = Arc::new(email_provider);
    let tokens: Arc<dyn TokenRegistry> = Arc::new(tokens);

    let app = Application::build(&config, email_provider, tokens).await?;
    app.run_until_stopped().await?;

    Ok(())
}
