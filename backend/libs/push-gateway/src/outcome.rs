use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ServiceProfile;
use crate::transport::HttpResponse;

pub const UNKNOWN_REASON: &str = "unknown";

/// Canonical result categories for one push attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeCategory {
    Success,
    InvalidRequest,
    AuthTokenInvalid,
    NotFound,
    RateLimited,
    PayloadTooLarge,
    ServerError,
    ServerUnavailable,
    /// Status code outside the gateway's documented table
    #[serde(rename = "unknown-error")]
    Unknown,
}

impl OutcomeCategory {
    /// Classify a status code for the given gateway
    pub fn from_status(profile: &ServiceProfile, status_code: u16) -> Self {
        match status_code {
            200 => OutcomeCategory::Success,
            400 => OutcomeCategory::InvalidRequest,
            401 | 403 => OutcomeCategory::AuthTokenInvalid,
            404 => OutcomeCategory::NotFound,
            413 => OutcomeCategory::PayloadTooLarge,
            500 => OutcomeCategory::ServerError,
            503 => OutcomeCategory::ServerUnavailable,
            code if code == profile.rate_limit_status => OutcomeCategory::RateLimited,
            _ => OutcomeCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCategory::Success => "success",
            OutcomeCategory::InvalidRequest => "invalid-request",
            OutcomeCategory::AuthTokenInvalid => "auth-token-invalid",
            OutcomeCategory::NotFound => "not-found",
            OutcomeCategory::RateLimited => "rate-limited",
            OutcomeCategory::PayloadTooLarge => "payload-too-large",
            OutcomeCategory::ServerError => "server-error",
            OutcomeCategory::ServerUnavailable => "server-unavailable",
            OutcomeCategory::Unknown => "unknown-error",
        }
    }
}

/// Categorized response of one request against one gateway endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub category: OutcomeCategory,
    pub message: String,
    pub status_code: u16,
    pub body: Value,
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Outcome {
    /// Map a status code, parsed body and headers to an outcome
    pub fn from_parts(
        profile: &ServiceProfile,
        status_code: u16,
        body: Value,
        headers: HashMap<String, String>,
    ) -> Self {
        let category = OutcomeCategory::from_status(profile, status_code);
        let messages = &profile.messages;

        let (message, reason) = match category {
            OutcomeCategory::Success => (&messages.success, None),
            // 404 never carries a usable reason
            OutcomeCategory::NotFound => (&messages.not_found, Some(UNKNOWN_REASON.to_string())),
            OutcomeCategory::InvalidRequest => (&messages.invalid_request, Some(body_reason(&body))),
            OutcomeCategory::AuthTokenInvalid if status_code == 401 => {
                (&messages.unauthorized, Some(body_reason(&body)))
            }
            OutcomeCategory::AuthTokenInvalid => (&messages.forbidden, Some(body_reason(&body))),
            OutcomeCategory::RateLimited => (&messages.rate_limited, Some(body_reason(&body))),
            OutcomeCategory::PayloadTooLarge => {
                (&messages.payload_too_large, Some(body_reason(&body)))
            }
            OutcomeCategory::ServerError => (&messages.server_error, Some(body_reason(&body))),
            OutcomeCategory::ServerUnavailable => {
                (&messages.server_unavailable, Some(body_reason(&body)))
            }
            OutcomeCategory::Unknown => (&messages.unknown, Some(body_reason(&body))),
        };

        Self {
            category,
            message: message.clone(),
            status_code,
            body,
            headers,
            reason,
        }
    }

    /// Map a raw transport response, tolerating empty or non-JSON bodies
    pub fn from_response(profile: &ServiceProfile, response: HttpResponse) -> Self {
        let body = parse_body(&response.body);
        Self::from_parts(profile, response.status, body, response.headers)
    }

    pub fn is_success(&self) -> bool {
        self.category == OutcomeCategory::Success
    }

    pub fn reason_or_unknown(&self) -> &str {
        self.reason.as_deref().unwrap_or(UNKNOWN_REASON)
    }
}

/// Outcomes keyed by destination
pub type SendResult = HashMap<String, Outcome>;

/// Parse a response body as JSON; empty, `null` and unparseable bodies become `{}`
pub fn parse_body(raw: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Null) | Err(_) => Value::Object(Default::default()),
        Ok(value) => value,
    }
}

fn body_reason(body: &Value) -> String {
    body.get("reason")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_REASON)
        .to_string()
}
