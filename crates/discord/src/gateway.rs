use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serenity::all::{
    ChannelId, Client, CommandInteraction, CommandOptionType, Context, CreateCommand,
    CreateCommandOption, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EventHandler as SerenityEventHandler,
    GatewayIntents, GuildId, Http, Interaction, InteractionId, Message, MessageId, Ready,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    commands::{CommandDefinition, PROMPT_OPTION_NAME, QUERY_COMMAND_NAME},
    events::{
        DiscordEvent, EventContext, EventDispatcher, GuildSummary, GuildsCachedEvent,
        HandlerResult, MessageAuthor, MessageEvent, QueryCommandEvent, ReadyEvent,
    },
    platform::{InteractionRef, PlatformClient, PlatformError},
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway client could not be built: {0}")]
    Build(#[source] serenity::Error),
    #[error("gateway connection failed: {0}")]
    Connection(#[source] serenity::Error),
}

pub fn relay_intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

pub fn ping_intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Owns the gateway connection. Serenity runs each incoming event on its own
/// task, so a slow webhook only delays the event that triggered it.
pub struct GatewayRunner {
    token: SecretString,
    intents: GatewayIntents,
    dispatcher: Arc<EventDispatcher>,
}

impl GatewayRunner {
    pub fn new(token: SecretString, intents: GatewayIntents, dispatcher: EventDispatcher) -> Self {
        Self { token, intents, dispatcher: Arc::new(dispatcher) }
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send,
    {
        let mut client = Client::builder(self.token.expose_secret(), self.intents)
            .event_handler(GatewayBridge::new(self.dispatcher))
            .await
            .map_err(GatewayError::Build)?;
        let shard_manager = client.shard_manager.clone();

        info!(
            event_name = "system.gateway.connecting",
            correlation_id = "bootstrap",
            intents = ?self.intents,
            "opening discord gateway connection"
        );

        tokio::select! {
            result = client.start() => result.map_err(GatewayError::Connection),
            () = shutdown => {
                info!(
                    event_name = "system.gateway.stopping",
                    correlation_id = "shutdown",
                    "shutting down discord shards"
                );
                shard_manager.shutdown_all().await;
                Ok(())
            }
        }
    }
}

/// Translates serenity callbacks into [`DiscordEvent`]s for the dispatcher.
pub struct GatewayBridge {
    dispatcher: Arc<EventDispatcher>,
}

impl GatewayBridge {
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self { dispatcher }
    }

    async fn forward(&self, ctx: &Context, event: DiscordEvent, correlation_id: String) {
        let event_type = event.event_type();
        let platform = Arc::new(SerenityPlatform::new(ctx.http.clone()));
        let context = EventContext::new(correlation_id, platform);

        match self.dispatcher.dispatch(&event, &context).await {
            Ok(HandlerResult::Ignored) => {}
            Ok(result) => debug!(
                event_name = "ingress.discord.dispatched",
                correlation_id = %context.correlation_id,
                event_type = ?event_type,
                result = ?result,
                "discord event handled"
            ),
            Err(error) => warn!(
                event_name = "ingress.discord.dispatch_failed",
                correlation_id = %context.correlation_id,
                event_type = ?event_type,
                error = %error,
                "discord event dispatch failed"
            ),
        }
    }
}

#[serenity::async_trait]
impl SerenityEventHandler for GatewayBridge {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let event = DiscordEvent::Ready(ready_event(&ready));
        self.forward(&ctx, event, format!("ready-{}", ready.session_id)).await;
    }

    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        let guilds = guilds
            .into_iter()
            .map(|id| GuildSummary { id: id.get(), name: id.name(&ctx.cache) })
            .collect();
        let event = DiscordEvent::GuildsCached(GuildsCachedEvent { guilds });
        self.forward(&ctx, event, "cache-ready".to_owned()).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let (guild_name, channel_name) = cached_location(&ctx, &msg);
        let event = DiscordEvent::MessageCreated(message_event(&msg, guild_name, channel_name));
        self.forward(&ctx, event, format!("message-{}", msg.id)).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let event = command_event(&command);
        self.forward(&ctx, event, format!("interaction-{}", command.id)).await;
    }
}

fn ready_event(ready: &Ready) -> ReadyEvent {
    ReadyEvent {
        user_id: ready.user.id.get(),
        user_name: ready.user.name.clone(),
        guild_ids: ready.guilds.iter().map(|guild| guild.id.get()).collect(),
    }
}

fn command_event(command: &CommandInteraction) -> DiscordEvent {
    if command.data.name != QUERY_COMMAND_NAME {
        return DiscordEvent::Unsupported { event_type: format!("command:{}", command.data.name) };
    }

    let prompt = command
        .data
        .options
        .iter()
        .find(|option| option.name == PROMPT_OPTION_NAME)
        .and_then(|option| option.value.as_str())
        .unwrap_or_default()
        .to_owned();

    DiscordEvent::QueryCommand(QueryCommandEvent {
        interaction: InteractionRef { id: command.id.get(), token: command.token.clone() },
        user_id: command.user.id.get(),
        channel_id: command.channel_id.get(),
        guild_id: command.guild_id.map(|id| id.get()),
        prompt,
    })
}

fn message_event(
    msg: &Message,
    guild_name: Option<String>,
    channel_name: Option<String>,
) -> MessageEvent {
    let display_name = msg
        .member
        .as_ref()
        .and_then(|member| member.nick.clone())
        .unwrap_or_else(|| msg.author.display_name().to_owned());

    MessageEvent {
        message_id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        channel_name,
        guild_id: msg.guild_id.map(|id| id.get()),
        guild_name,
        author: MessageAuthor {
            id: msg.author.id.get(),
            username: msg.author.name.clone(),
            display_name,
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        jump_url: msg.link(),
        created_at: DateTime::<Utc>::from_timestamp(msg.timestamp.unix_timestamp(), 0),
    }
}

/// Guild and channel names from the gateway cache; never hits the REST API.
fn cached_location(ctx: &Context, msg: &Message) -> (Option<String>, Option<String>) {
    let Some(guild) = msg.guild(&ctx.cache) else {
        return (None, None);
    };

    let channel_name = guild
        .channels
        .get(&msg.channel_id)
        .or_else(|| guild.threads.iter().find(|thread| thread.id == msg.channel_id))
        .map(|channel| channel.name.clone());

    (Some(guild.name.clone()), channel_name)
}

pub(crate) fn create_command(definition: &CommandDefinition) -> CreateCommand {
    definition.options.iter().fold(
        CreateCommand::new(definition.name.as_str()).description(definition.description.as_str()),
        |command, option| {
            command.add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    option.name.as_str(),
                    option.description.as_str(),
                )
                .required(option.required),
            )
        },
    )
}

pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PlatformClient for SerenityPlatform {
    async fn defer_ephemeral(&self, interaction: &InteractionRef) -> Result<(), PlatformError> {
        let response =
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(true));
        self.http
            .create_interaction_response(
                InteractionId::new(interaction.id),
                &interaction.token,
                &response,
                Vec::new(),
            )
            .await
            .map_err(|error| PlatformError::Acknowledge(error.to_string()))
    }

    async fn follow_up_ephemeral(
        &self,
        interaction: &InteractionRef,
        content: &str,
    ) -> Result<(), PlatformError> {
        let followup = CreateInteractionResponseFollowup::new().content(content).ephemeral(true);
        self.http
            .create_followup_message(&interaction.token, &followup, Vec::new())
            .await
            .map(|_| ())
            .map_err(|error| PlatformError::FollowUp(error.to_string()))
    }

    async fn reply(
        &self,
        channel_id: u64,
        message_id: u64,
        content: &str,
    ) -> Result<(), PlatformError> {
        let channel = ChannelId::new(channel_id);
        let message = CreateMessage::new()
            .content(content)
            .reference_message((channel, MessageId::new(message_id)));
        channel
            .send_message(&self.http, message)
            .await
            .map(|_| ())
            .map_err(|error| PlatformError::Reply(error.to_string()))
    }

    async fn register_guild_commands(
        &self,
        guild_id: u64,
        commands: &[CommandDefinition],
    ) -> Result<usize, PlatformError> {
        let builders = commands.iter().map(create_command).collect();
        GuildId::new(guild_id)
            .set_commands(&self.http, builders)
            .await
            .map(|registered| registered.len())
            .map_err(|error| PlatformError::Registration(error.to_string()))
    }
}
