use chrono::{DateTime, Utc};
use serde::Serialize;

/// JSON body POSTed to the webhook. Command payloads only carry `message`;
/// relayed channel messages carry the author and location metadata too.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutboundPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<PayloadAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PayloadAuthor {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

impl OutboundPayload {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self { message: prompt.into(), ..Self::default() }
    }
}
