use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::DeliveryError;
use crate::payload::OutboundPayload;

pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// POSTs the payload once. Only an HTTP 200 counts as delivered.
    async fn deliver(&self, payload: &OutboundPayload) -> Result<(), DeliveryError>;
}

/// Builds the outbound header set: JSON content negotiation plus the optional
/// auth header. The auth header is only sent when a value is configured; a
/// value without a name goes out as `Authorization`.
pub fn build_headers(
    header_name: Option<&str>,
    header_value: Option<&str>,
) -> Result<HeaderMap, DeliveryError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let Some(value) = header_value.filter(|value| !value.trim().is_empty()) else {
        return Ok(headers);
    };
    let name = header_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_AUTH_HEADER);

    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
        DeliveryError::InvalidHeader { name: name.to_owned(), reason: error.to_string() }
    })?;
    let mut header_value = HeaderValue::from_str(value).map_err(|error| {
        DeliveryError::InvalidHeader { name: name.to_owned(), reason: error.to_string() }
    })?;
    header_value.set_sensitive(true);
    headers.insert(header_name, header_value);

    Ok(headers)
}

/// Scheme, host and port of a webhook URL. Hook URLs carry their secret in the
/// path or userinfo, so nothing else is kept.
pub fn webhook_origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str().filter(|host| !host.is_empty())?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{host}:{port}", parsed.scheme())),
        None => Some(format!("{}://{host}", parsed.scheme())),
    }
}

pub struct HttpWebhookClient {
    client: Client,
    url: String,
    headers: HeaderMap,
}

impl HttpWebhookClient {
    pub fn new(
        url: impl Into<String>,
        header_name: Option<&str>,
        header_value: Option<&str>,
    ) -> Result<Self, DeliveryError> {
        let headers = build_headers(header_name, header_value)?;
        let client =
            Client::builder().build().map_err(|error| DeliveryError::Transport(error.to_string()))?;
        Ok(Self { client, url: url.into(), headers })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DeliveryError> {
        Self::new(
            config.webhook.url.trim(),
            config.webhook.header_name.as_deref(),
            config.header_value(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
impl WebhookSink for HttpWebhookClient {
    async fn deliver(&self, payload: &OutboundPayload) -> Result<(), DeliveryError> {
        debug!(
            event_name = "egress.webhook.request",
            url = %self.url,
            message_id = payload.message_id.as_deref().unwrap_or("none"),
            "posting payload to webhook"
        );

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(payload)
            .send()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::UnexpectedStatus { status: status.as_u16(), body })
    }
}
