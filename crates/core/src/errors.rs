use thiserror::Error;

pub const NETWORK_ERROR_REPLY: &str = "A network error occurred. Please try again later.";
pub const INTERNAL_ERROR_REPLY: &str = "An unexpected internal error occurred.";

/// Failure to hand a payload to the webhook. Every delivery is a single
/// attempt; callers decide whether the failure is user-visible.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("webhook responded with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("webhook transport failed: {0}")]
    Transport(String),
    #[error("invalid webhook header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl DeliveryError {
    /// Reply text safe to show the invoking user.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnexpectedStatus { status, .. } => {
                format!("An error occurred while processing your request. Status: {status}")
            }
            Self::Transport(_) => NETWORK_ERROR_REPLY.to_owned(),
            Self::InvalidHeader { .. } => INTERNAL_ERROR_REPLY.to_owned(),
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::UnexpectedStatus { .. } => "upstream_status",
            Self::Transport(_) => "transport",
            Self::InvalidHeader { .. } => "webhook_headers",
        }
    }
}
