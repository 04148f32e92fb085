use async_trait::async_trait;
use thiserror::Error;

use crate::commands::CommandDefinition;

/// Enough of an interaction to answer it later: its id and continuation token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionRef {
    pub id: u64,
    pub token: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("interaction acknowledgement failed: {0}")]
    Acknowledge(String),
    #[error("interaction follow-up failed: {0}")]
    FollowUp(String),
    #[error("message reply failed: {0}")]
    Reply(String),
    #[error("command registration failed: {0}")]
    Registration(String),
}

/// Outbound calls handlers make back to the chat platform.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Defers the interaction so only the invoker sees the eventual answer.
    async fn defer_ephemeral(&self, interaction: &InteractionRef) -> Result<(), PlatformError>;

    async fn follow_up_ephemeral(
        &self,
        interaction: &InteractionRef,
        content: &str,
    ) -> Result<(), PlatformError>;

    async fn reply(
        &self,
        channel_id: u64,
        message_id: u64,
        content: &str,
    ) -> Result<(), PlatformError>;

    /// Replaces the guild's registered commands, returning how many are live.
    async fn register_guild_commands(
        &self,
        guild_id: u64,
        commands: &[CommandDefinition],
    ) -> Result<usize, PlatformError>;
}

#[derive(Default)]
pub struct NoopPlatformClient;

#[async_trait]
impl PlatformClient for NoopPlatformClient {
    async fn defer_ephemeral(&self, _interaction: &InteractionRef) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn follow_up_ephemeral(
        &self,
        _interaction: &InteractionRef,
        _content: &str,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn reply(
        &self,
        _channel_id: u64,
        _message_id: u64,
        _content: &str,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn register_guild_commands(
        &self,
        _guild_id: u64,
        commands: &[CommandDefinition],
    ) -> Result<usize, PlatformError> {
        Ok(commands.len())
    }
}
