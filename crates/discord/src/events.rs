use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use webhook_relay_core::{errors::DeliveryError, OutboundPayload, WebhookSink};

use crate::{
    commands::{query_command, CommandDefinition, DEFAULT_COMMAND_PREFIX, QUERY_ACCEPTED_REPLY},
    ping::PingCommandHandler,
    platform::{InteractionRef, NoopPlatformClient, PlatformClient, PlatformError},
    relay::{MessageRelayHandler, RelayFilter},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscordEvent {
    Ready(ReadyEvent),
    GuildsCached(GuildsCachedEvent),
    QueryCommand(QueryCommandEvent),
    MessageCreated(MessageEvent),
    Unsupported { event_type: String },
}

impl DiscordEvent {
    pub fn event_type(&self) -> DiscordEventType {
        match self {
            Self::Ready(_) => DiscordEventType::Ready,
            Self::GuildsCached(_) => DiscordEventType::GuildsCached,
            Self::QueryCommand(_) => DiscordEventType::QueryCommand,
            Self::MessageCreated(_) => DiscordEventType::MessageCreated,
            Self::Unsupported { .. } => DiscordEventType::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscordEventType {
    Ready,
    GuildsCached,
    QueryCommand,
    MessageCreated,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadyEvent {
    pub user_id: u64,
    pub user_name: String,
    pub guild_ids: Vec<u64>,
}

/// Fired once every guild from the ready payload has arrived in the cache,
/// which is the first point where guild names are known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildsCachedEvent {
    pub guilds: Vec<GuildSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildSummary {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryCommandEvent {
    pub interaction: InteractionRef,
    pub user_id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub prompt: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub message_id: u64,
    pub channel_id: u64,
    pub channel_name: Option<String>,
    pub guild_id: Option<u64>,
    pub guild_name: Option<String>,
    pub author: MessageAuthor,
    pub content: String,
    pub jump_url: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageAuthor {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub bot: bool,
}

#[derive(Clone)]
pub struct EventContext {
    pub correlation_id: String,
    pub platform: Arc<dyn PlatformClient>,
}

impl EventContext {
    pub fn new(correlation_id: impl Into<String>, platform: Arc<dyn PlatformClient>) -> Self {
        Self { correlation_id: correlation_id.into(), platform }
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self::new("unknown-correlation-id", Arc::new(NoopPlatformClient))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Replied(String),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> DiscordEventType;
    async fn handle(
        &self,
        event: &DiscordEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<DiscordEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        event: &DiscordEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(event, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Wires the webhook relay: guild command sync on ready, `/query` forwarding
/// and passive relay of messages from the watched channel.
pub fn relay_dispatcher(
    sink: Arc<dyn WebhookSink>,
    guild_id: u64,
    query_channel_id: u64,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(ReadyHandler::with_guild_commands(guild_id, vec![query_command()]));
    dispatcher.register(GuildInventoryHandler);
    dispatcher.register(QueryCommandHandler::new(sink.clone()));
    dispatcher.register(MessageRelayHandler::new(sink, RelayFilter::new(query_channel_id)));
    dispatcher
}

/// Wires the minimal prefix-command bot. It shares nothing with the relay.
pub fn ping_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(ReadyHandler::new());
    dispatcher.register(GuildInventoryHandler);
    dispatcher.register(PingCommandHandler::new(DEFAULT_COMMAND_PREFIX));
    dispatcher
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildRegistration {
    pub guild_id: u64,
    pub commands: Vec<CommandDefinition>,
}

pub struct ReadyHandler {
    registration: Option<GuildRegistration>,
}

impl ReadyHandler {
    pub fn new() -> Self {
        Self { registration: None }
    }

    pub fn with_guild_commands(guild_id: u64, commands: Vec<CommandDefinition>) -> Self {
        Self { registration: Some(GuildRegistration { guild_id, commands }) }
    }
}

impl Default for ReadyHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventHandler for ReadyHandler {
    fn event_type(&self) -> DiscordEventType {
        DiscordEventType::Ready
    }

    async fn handle(
        &self,
        event: &DiscordEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let DiscordEvent::Ready(ready) = event else {
            return Ok(HandlerResult::Ignored);
        };

        if let Some(registration) = &self.registration {
            let registered = ctx
                .platform
                .register_guild_commands(registration.guild_id, &registration.commands)
                .await?;
            info!(
                event_name = "system.discord.commands_synced",
                correlation_id = %ctx.correlation_id,
                guild_id = registration.guild_id,
                registered,
                "application commands synced"
            );
        }

        // With no guilds the cache-ready event never arrives, so this is the
        // only readiness line.
        if ready.guild_ids.is_empty() {
            info!(
                event_name = "system.discord.ready",
                correlation_id = %ctx.correlation_id,
                user = %ready.user_name,
                user_id = ready.user_id,
                guilds = %guild_list(&[]),
                "logged in; bot is ready"
            );
        } else {
            info!(
                event_name = "system.discord.logged_in",
                correlation_id = %ctx.correlation_id,
                user = %ready.user_name,
                user_id = ready.user_id,
                guild_count = ready.guild_ids.len(),
                "logged in; waiting for guild cache"
            );
        }

        Ok(HandlerResult::Processed)
    }
}

/// Logs the guild names the bot is connected to once the cache has them.
pub struct GuildInventoryHandler;

#[async_trait]
impl EventHandler for GuildInventoryHandler {
    fn event_type(&self) -> DiscordEventType {
        DiscordEventType::GuildsCached
    }

    async fn handle(
        &self,
        event: &DiscordEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let DiscordEvent::GuildsCached(cached) = event else {
            return Ok(HandlerResult::Ignored);
        };

        info!(
            event_name = "system.discord.ready",
            correlation_id = %ctx.correlation_id,
            guilds = %guild_list(&cached.guilds),
            "bot is ready"
        );

        Ok(HandlerResult::Processed)
    }
}

fn guild_list(guilds: &[GuildSummary]) -> String {
    if guilds.is_empty() {
        return "No guilds".to_owned();
    }

    guilds
        .iter()
        .map(|guild| guild.name.clone().unwrap_or_else(|| guild.id.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct QueryCommandHandler {
    sink: Arc<dyn WebhookSink>,
}

impl QueryCommandHandler {
    pub fn new(sink: Arc<dyn WebhookSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl EventHandler for QueryCommandHandler {
    fn event_type(&self) -> DiscordEventType {
        DiscordEventType::QueryCommand
    }

    async fn handle(
        &self,
        event: &DiscordEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let DiscordEvent::QueryCommand(command) = event else {
            return Ok(HandlerResult::Ignored);
        };

        // Discord drops interactions not acknowledged within three seconds.
        ctx.platform.defer_ephemeral(&command.interaction).await?;

        let payload = OutboundPayload::from_prompt(command.prompt.clone());
        let reply = match self.sink.deliver(&payload).await {
            Ok(()) => {
                info!(
                    event_name = "egress.webhook.query_forwarded",
                    correlation_id = %ctx.correlation_id,
                    user_id = command.user_id,
                    channel_id = command.channel_id,
                    "query forwarded to webhook"
                );
                QUERY_ACCEPTED_REPLY.to_owned()
            }
            Err(error) => {
                log_delivery_failure(&error, &ctx.correlation_id, "query forwarding failed");
                error.user_message()
            }
        };

        ctx.platform.follow_up_ephemeral(&command.interaction, &reply).await?;
        Ok(HandlerResult::Replied(reply))
    }
}

pub(crate) fn log_delivery_failure(error: &DeliveryError, correlation_id: &str, message: &str) {
    match error {
        DeliveryError::UnexpectedStatus { status, body } => warn!(
            event_name = "egress.webhook.failed",
            correlation_id = %correlation_id,
            error_class = error.error_class(),
            status = *status,
            body = %body,
            "{message}"
        ),
        DeliveryError::Transport(_) | DeliveryError::InvalidHeader { .. } => warn!(
            event_name = "egress.webhook.failed",
            correlation_id = %correlation_id,
            error_class = error.error_class(),
            error = %error,
            "{message}"
        ),
    }
}
