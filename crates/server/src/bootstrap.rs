use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use webhook_relay_core::{
    config::{AppConfig, ConfigError, LoadOptions, RunMode},
    errors::DeliveryError,
    HttpWebhookClient,
};
use webhook_relay_discord::{
    gateway::{ping_intents, relay_intents, GatewayRunner},
    ping_dispatcher, relay_dispatcher, EventDispatcher,
};

pub struct Application {
    pub config: AppConfig,
    pub mode: RunMode,
    pub dispatcher: EventDispatcher,
}

impl Application {
    pub fn into_runner(self) -> GatewayRunner {
        let intents = match self.mode {
            RunMode::Ping => ping_intents(),
            _ => relay_intents(),
        };
        GatewayRunner::new(self.config.discord.bot_token, intents, self.dispatcher)
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("webhook client setup failed: {0}")]
    Webhook(#[from] DeliveryError),
    #[error("`{0:?}` mode has no gateway bot")]
    UnsupportedMode(RunMode),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let mode = options.mode;
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config, mode)
}

pub fn bootstrap_with_config(
    config: AppConfig,
    mode: RunMode,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        mode = ?mode,
        "starting application bootstrap"
    );

    let dispatcher = match mode {
        RunMode::Relay => {
            let webhook = HttpWebhookClient::from_config(&config)?;
            info!(
                event_name = "system.bootstrap.webhook_ready",
                correlation_id = "bootstrap",
                auth_header = config.header_value().is_some(),
                "webhook client configured"
            );
            relay_dispatcher(
                Arc::new(webhook),
                config.discord.guild_id,
                config.discord.query_channel_id,
            )
        }
        RunMode::Ping => ping_dispatcher(),
        RunMode::WebhookProbe => return Err(BootstrapError::UnsupportedMode(mode)),
    };

    Ok(Application { config, mode, dispatcher })
}
