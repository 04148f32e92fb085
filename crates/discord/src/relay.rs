use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use webhook_relay_core::{OutboundPayload, PayloadAuthor, WebhookSink};

use crate::events::{
    log_delivery_failure, DiscordEvent, DiscordEventType, EventContext, EventHandler,
    EventHandlerError, HandlerResult, MessageEvent,
};

/// Leading characters other bots use for their own command syntax.
pub const RESERVED_PREFIXES: [char; 4] = ['/', '!', '?', '.'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    BotAuthor,
    OtherChannel,
    EmptyContent,
    ReservedPrefix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayFilter {
    channel_id: u64,
}

impl RelayFilter {
    pub fn new(channel_id: u64) -> Self {
        Self { channel_id }
    }

    /// Applies the relay rules in order and returns the trimmed content to
    /// forward.
    pub fn screen<'a>(&self, message: &'a MessageEvent) -> Result<&'a str, SkipReason> {
        if message.author.bot {
            return Err(SkipReason::BotAuthor);
        }
        if message.channel_id != self.channel_id {
            return Err(SkipReason::OtherChannel);
        }

        let content = message.content.trim();
        if content.is_empty() {
            return Err(SkipReason::EmptyContent);
        }
        if content.starts_with(&RESERVED_PREFIXES[..]) {
            return Err(SkipReason::ReservedPrefix);
        }

        Ok(content)
    }
}

pub fn message_payload(message: &MessageEvent, content: &str) -> OutboundPayload {
    OutboundPayload {
        message: content.to_owned(),
        author: Some(PayloadAuthor {
            id: message.author.id.to_string(),
            username: message.author.username.clone(),
            display_name: message.author.display_name.clone(),
        }),
        message_url: Some(message.jump_url.clone()),
        message_id: Some(message.message_id.to_string()),
        channel_id: Some(message.channel_id.to_string()),
        channel_name: message.channel_name.clone(),
        guild_id: message.guild_id.map(|id| id.to_string()),
        guild_name: message.guild_name.clone(),
        created_at: message.created_at,
    }
}

/// Forwards ordinary chatter from the watched channel. Outcomes only reach
/// the logs; nobody in the channel is told about failures.
pub struct MessageRelayHandler {
    sink: Arc<dyn WebhookSink>,
    filter: RelayFilter,
}

impl MessageRelayHandler {
    pub fn new(sink: Arc<dyn WebhookSink>, filter: RelayFilter) -> Self {
        Self { sink, filter }
    }
}

#[async_trait]
impl EventHandler for MessageRelayHandler {
    fn event_type(&self) -> DiscordEventType {
        DiscordEventType::MessageCreated
    }

    async fn handle(
        &self,
        event: &DiscordEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let DiscordEvent::MessageCreated(message) = event else {
            return Ok(HandlerResult::Ignored);
        };
        let Ok(content) = self.filter.screen(message) else {
            return Ok(HandlerResult::Ignored);
        };

        let payload = message_payload(message, content);
        match self.sink.deliver(&payload).await {
            Ok(()) => info!(
                event_name = "egress.webhook.message_relayed",
                correlation_id = %ctx.correlation_id,
                message_id = message.message_id,
                channel_id = message.channel_id,
                author_id = message.author.id,
                "message relayed to webhook"
            ),
            Err(error) => {
                log_delivery_failure(&error, &ctx.correlation_id, "message relay failed");
            }
        }

        Ok(HandlerResult::Processed)
    }
}
