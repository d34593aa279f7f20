use anyhow::{Context, Result};
use dotenvy::dotenv;
use log::{info, warn};
use potluck::{build_router, AppContext, BlobStore, Config, Database, EventSeed, OpenAiGateway, TwilioGateway};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    // The openai crate reads its key from the environment, not from our config
    if let Some(key) = &config.openai_api_key {
        std::env::set_var("OPENAI_API_KEY", key);
        std::env::set_var("OPENAI_KEY", key);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting potluck server v{}...", potluck::features::get_version());

    let database = Database::new(&config.database_path).await?;
    let store: Arc<dyn BlobStore> = Arc::new(database);

    let seed = match &config.event_config_path {
        Some(path) => {
            let seed = EventSeed::load(path)?;
            info!("Default event configuration loaded from {path}");
            Some(seed)
        }
        None => None,
    };

    let sms = Arc::new(TwilioGateway::new(config.sms.clone(), config.gateway_timeout)?);
    if config.sms.is_none() {
        warn!("Twilio credentials not set; reminders and broadcasts are disabled");
    }

    let suggestions = Arc::new(OpenAiGateway::new(
        &config.openai_model,
        config.openai_api_key.as_deref(),
        config.gateway_timeout,
    ));
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY not set; recipe suggestions are disabled");
    }

    if config.cron_secret.is_none() {
        warn!("CRON_SECRET not set; only an admin session can trigger the reminder sweep");
    }

    let ctx = AppContext::new(&config, store, sms, suggestions, seed);
    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
