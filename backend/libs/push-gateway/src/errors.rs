use std::time::Duration;

use thiserror::Error;

use crate::outcome::Outcome;

/// Push Gateway Client Error Types
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No destinations given")]
    NoDestinations,

    #[error("Error requesting access key to push data: status {} ({})", .0.status_code, .0.reason_or_unknown())]
    AccessKey(Box<Outcome>),

    #[error("Failed to parse token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Token request failed: {0}")]
    TokenTransport(#[source] TransportError),

    #[error("Unexpected error sending notification: {0}")]
    Notification(#[source] TransportError),
}

impl PushError {
    /// Decomposed token endpoint response, when the token request was rejected
    pub fn failed_response(&self) -> Option<&Outcome> {
        match self {
            PushError::AccessKey(outcome) => Some(outcome.as_ref()),
            _ => None,
        }
    }
}

/// Errors raised below the status mapping: the request never produced a response
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}
