use async_trait::async_trait;
use tracing::info;

use crate::{
    commands::{help_text, parse_prefix_command, BuiltinCommand, PING_REPLY},
    events::{
        DiscordEvent, DiscordEventType, EventContext, EventHandler, EventHandlerError,
        HandlerResult,
    },
};

/// Prefix commands for the connectivity-check bot: `!ping` and `!help`.
pub struct PingCommandHandler {
    prefix: String,
}

impl PingCommandHandler {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

#[async_trait]
impl EventHandler for PingCommandHandler {
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
        if message.author.bot {
            return Ok(HandlerResult::Ignored);
        }
        let Some(command) = parse_prefix_command(&self.prefix, &message.content)
            .and_then(|parsed| BuiltinCommand::from_name(&parsed.name))
        else {
            return Ok(HandlerResult::Ignored);
        };

        let reply = match command {
            BuiltinCommand::Ping => PING_REPLY.to_owned(),
            BuiltinCommand::Help => help_text(&self.prefix),
        };
        ctx.platform.reply(message.channel_id, message.message_id, &reply).await?;

        info!(
            event_name = "ingress.discord.prefix_command",
            correlation_id = %ctx.correlation_id,
            command = command.name(),
            author_id = message.author.id,
            channel_id = message.channel_id,
            "prefix command answered"
        );
        Ok(HandlerResult::Replied(reply))
    }
}
