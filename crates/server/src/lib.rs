pub mod bootstrap;
pub mod logging;

use anyhow::Result;
use webhook_relay_core::config::{AppConfig, LoadOptions, RunMode};

/// Shared entry point for both gateway binaries. Runs until Ctrl-C or until
/// the gateway gives up.
pub async fn run(mode: RunMode) -> Result<()> {
    // A missing .env is fine; the process environment may already be set.
    dotenvy::dotenv().ok();

    let config = AppConfig::load(LoadOptions { mode, ..LoadOptions::default() })?;
    logging::init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config, mode)?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        mode = ?mode,
        handlers = app.dispatcher.handler_count(),
        "discord bot starting"
    );

    app.into_runner().run_until(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        mode = ?mode,
        "discord bot stopped"
    );
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(
            event_name = "system.server.signal_unavailable",
            correlation_id = "shutdown",
            error = %error,
            "could not listen for ctrl-c; running until the gateway exits"
        );
        std::future::pending::<()>().await;
    }
}
