//! `pinic-console` binary: runs a headless console against a live forwarder
//! and streams tree refreshes and warnings to the log.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pinic_console::adapters::{
    HttpApiConfig, HttpPinicApi, InMemoryEventBus, SocketIoChannel, SocketIoConfig,
};
use pinic_console::application::Console;
use pinic_console::config::{AppConfig, LoggingConfig};
use pinic_console::ports::RealtimeChannel;

fn init_tracing(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.logging);
    info!(backend = %config.backend.base_url, "starting pinic console");

    // Build adapters
    let api = Arc::new(HttpPinicApi::new(
        HttpApiConfig::new(config.backend.base_url.clone())
            .with_timeout(config.backend.request_timeout()),
    )?);
    let realtime: Arc<dyn RealtimeChannel> = Arc::new(SocketIoChannel::new(SocketIoConfig::new(
        config.backend.base_url.clone(),
        config.backend.warning_namespace.clone(),
    ))?);
    let bus = Arc::new(InMemoryEventBus::new());

    let console = Console::new(api, bus, &config.console)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(e) => error!(error = %e, "listening for ctrl-c failed"),
        }
        let _ = shutdown_tx.send(true);
    });

    console.run(Some(realtime), shutdown_rx).await;

    let warnings = console.warnings().len().await;
    info!(warnings, "pinic console stopped");
    Ok(())
}
