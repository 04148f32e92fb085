//! Discord Integration - gateway bot interface
//!
//! This crate provides the Discord side of the relay:
//! - **Gateway** (`gateway`) - serenity client, intents and shard shutdown
//! - **Commands** (`commands`) - `/query` definition and `!` prefix parsing
//! - **Events** (`events`) - ready, slash command and message dispatch
//! - **Relay** (`relay`) - channel watcher that forwards chatter to the webhook
//! - **Ping** (`ping`) - the minimal health-check bot
//!
//! # Architecture
//!
//! ```text
//! Discord Gateway → GatewayBridge → EventDispatcher → Handlers → WebhookSink
//!                                         ↓
//!                      PlatformClient (defer, follow-up, reply)
//! ```
//!
//! # Key Types
//!
//! - `GatewayRunner` - gateway connection that stops on a shutdown future
//! - `EventDispatcher` - routes events to the handler registered for their type
//! - `PlatformClient` - outbound calls back to Discord, swappable in tests

pub mod commands;
pub mod events;
pub mod gateway;
pub mod ping;
pub mod platform;
pub mod relay;

#[cfg(test)]
mod testing;

pub use events::{ping_dispatcher, relay_dispatcher, EventDispatcher};
pub use gateway::{ping_intents, relay_intents, GatewayError, GatewayRunner};
