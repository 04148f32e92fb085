use webhook_relay_core::{
    config::{AppConfig, LoadOptions, RunMode},
    errors::DeliveryError,
    HttpWebhookClient, OutboundPayload, WebhookSink,
};

use super::CommandResult;

const COMMAND: &str = "send";

pub fn run(message: &str) -> CommandResult {
    let message = message.trim();
    if message.is_empty() {
        return CommandResult::failure(COMMAND, "invalid_input", "message must not be empty", 2);
    }

    let options = LoadOptions { mode: RunMode::WebhookProbe, ..LoadOptions::default() };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let client = match HttpWebhookClient::from_config(&config) {
        Ok(client) => client,
        Err(error) => return delivery_failure(&error),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    let payload = OutboundPayload::from_prompt(message);
    match runtime.block_on(client.deliver(&payload)) {
        Ok(()) => CommandResult::success(COMMAND, "webhook accepted the message (HTTP 200)"),
        Err(error) => delivery_failure(&error),
    }
}

fn delivery_failure(error: &DeliveryError) -> CommandResult {
    let exit_code = match error {
        DeliveryError::InvalidHeader { .. } => 3,
        DeliveryError::UnexpectedStatus { .. } => 4,
        DeliveryError::Transport(_) => 5,
    };
    CommandResult::failure(COMMAND, error.error_class(), error.to_string(), exit_code)
}
