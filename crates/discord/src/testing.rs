use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use webhook_relay_core::{errors::DeliveryError, OutboundPayload, WebhookSink};

use crate::{
    commands::CommandDefinition,
    platform::{InteractionRef, PlatformClient, PlatformError},
};

/// Every outbound call in the order it happened, platform and webhook alike.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Defer(u64),
    FollowUp(u64, String),
    Reply(u64, u64, String),
    Register(u64, Vec<String>),
    Deliver(String),
}

#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<Call>>,
    fail_defer: bool,
}

impl RecordingPlatform {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_defer() -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), fail_defer: true })
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl PlatformClient for RecordingPlatform {
    async fn defer_ephemeral(&self, interaction: &InteractionRef) -> Result<(), PlatformError> {
        if self.fail_defer {
            return Err(PlatformError::Acknowledge("unknown interaction".to_owned()));
        }
        self.record(Call::Defer(interaction.id)).await;
        Ok(())
    }

    async fn follow_up_ephemeral(
        &self,
        interaction: &InteractionRef,
        content: &str,
    ) -> Result<(), PlatformError> {
        self.record(Call::FollowUp(interaction.id, content.to_owned())).await;
        Ok(())
    }

    async fn reply(
        &self,
        channel_id: u64,
        message_id: u64,
        content: &str,
    ) -> Result<(), PlatformError> {
        self.record(Call::Reply(channel_id, message_id, content.to_owned())).await;
        Ok(())
    }

    async fn register_guild_commands(
        &self,
        guild_id: u64,
        commands: &[CommandDefinition],
    ) -> Result<usize, PlatformError> {
        let names = commands.iter().map(|command| command.name.clone()).collect();
        self.record(Call::Register(guild_id, names)).await;
        Ok(commands.len())
    }
}

/// Webhook double that answers from a script and logs into the platform's
/// call list so tests can assert ordering across both.
pub struct ScriptedSink {
    results: Mutex<VecDeque<Result<(), DeliveryError>>>,
    payloads: Mutex<Vec<OutboundPayload>>,
    log: Arc<RecordingPlatform>,
}

impl ScriptedSink {
    pub fn shared(
        results: Vec<Result<(), DeliveryError>>,
        log: Arc<RecordingPlatform>,
    ) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            payloads: Mutex::new(Vec::new()),
            log,
        })
    }

    pub async fn payloads(&self) -> Vec<OutboundPayload> {
        self.payloads.lock().await.clone()
    }
}

#[async_trait]
impl WebhookSink for ScriptedSink {
    async fn deliver(&self, payload: &OutboundPayload) -> Result<(), DeliveryError> {
        self.log.record(Call::Deliver(payload.message.clone())).await;
        self.payloads.lock().await.push(payload.clone());
        self.results.lock().await.pop_front().unwrap_or(Ok(()))
    }
}
