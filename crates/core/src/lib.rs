//! Core building blocks for the webhook relay: configuration loading, the
//! outbound JSON payload, and delivery to the automation webhook.

pub mod config;
pub mod errors;
pub mod payload;
pub mod webhook;

pub use config::{AppConfig, ConfigError, LoadOptions, RunMode};
pub use errors::DeliveryError;
pub use payload::{OutboundPayload, PayloadAuthor};
pub use webhook::{HttpWebhookClient, WebhookSink};
