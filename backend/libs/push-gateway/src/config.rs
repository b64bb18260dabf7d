use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::PushError;

pub const WNS_ACCESS_URL: &str = "https://login.live.com/accesstoken.srf";
pub const WNS_ACCESS_SCOPE: &str = "notify.windows.com";
pub const WNS_PUSH_CONTENT_TYPE: &str = "application/octet-stream";

pub const ADM_ACCESS_URL: &str = "https://api.amazon.com/auth/O2/token";
pub const ADM_ACCESS_SCOPE: &str = "messaging:push";
pub const ADM_PUSH_CONTENT_TYPE: &str = "application/json";
pub const ADM_PUSH_URL_TEMPLATE: &str =
    "https://api.amazon.com/messaging/registrations/{destination}/messages";

const DESTINATION_PLACEHOLDER: &str = "{destination}";

/// How a destination turns into the URL a push is POSTed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEndpoint {
    /// The destination is already a URL (WNS channel URIs)
    Destination,
    /// The destination is substituted for `{destination}` (ADM registration ids)
    Template(String),
}

impl PushEndpoint {
    pub fn url_for(&self, destination: &str) -> String {
        match self {
            PushEndpoint::Destination => destination.to_string(),
            PushEndpoint::Template(template) => {
                template.replace(DESTINATION_PLACEHOLDER, destination)
            }
        }
    }
}

/// Human-readable descriptions attached to each outcome category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessages {
    pub success: String,
    pub invalid_request: String,
    pub unauthorized: String,
    pub forbidden: String,
    pub not_found: String,
    pub rate_limited: String,
    pub payload_too_large: String,
    pub server_error: String,
    pub server_unavailable: String,
    pub unknown: String,
}

impl StatusMessages {
    fn common(service: &str) -> Self {
        Self {
            success: "success".to_string(),
            invalid_request: "Invalid request".to_string(),
            unauthorized: "Client authentication failed or auth token invalid".to_string(),
            forbidden: "Invalid token".to_string(),
            not_found: "Invalid token".to_string(),
            rate_limited: "Exceeded maximum allowable rate of messages".to_string(),
            payload_too_large: "Payload is too large".to_string(),
            server_error: format!("There was an internal error in the {} server", service),
            server_unavailable: "Server is temporarily unavailable".to_string(),
            unknown: format!("Unexpected response from the {} server", service),
        }
    }
}

/// Capability descriptor for one push gateway.
///
/// Dispatch logic is identical across gateways; everything that differs
/// (authorization endpoint, scope, headers, rate-limit status, messages)
/// lives here and is selected when the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProfile {
    pub name: String,
    pub auth_url: String,
    pub scope: String,
    pub content_type: String,
    pub extra_headers: Vec<(String, String)>,
    pub rate_limit_status: u16,
    pub push_endpoint: PushEndpoint,
    pub messages: StatusMessages,
}

impl ServiceProfile {
    /// Microsoft Windows Push Notification Services, raw notifications
    pub fn wns() -> Self {
        let mut messages = StatusMessages::common("WNS");
        messages.invalid_request = "Wrong headers".to_string();
        messages.unauthorized = "Access token expired".to_string();

        Self {
            name: "WNS".to_string(),
            auth_url: WNS_ACCESS_URL.to_string(),
            scope: WNS_ACCESS_SCOPE.to_string(),
            content_type: WNS_PUSH_CONTENT_TYPE.to_string(),
            extra_headers: vec![("X-WNS-Type".to_string(), "wns/raw".to_string())],
            rate_limit_status: 406,
            push_endpoint: PushEndpoint::Destination,
            messages,
        }
    }

    /// Amazon Device Messaging
    pub fn adm() -> Self {
        Self {
            name: "ADM".to_string(),
            auth_url: ADM_ACCESS_URL.to_string(),
            scope: ADM_ACCESS_SCOPE.to_string(),
            content_type: ADM_PUSH_CONTENT_TYPE.to_string(),
            extra_headers: vec![
                (
                    "X-Amzn-Type-Version".to_string(),
                    "com.amazon.device.messaging.ADMMessage@1.0".to_string(),
                ),
                ("Accept".to_string(), "application/json".to_string()),
                (
                    "X-Amzn-Accept-Type".to_string(),
                    "com.amazon.device.messaging.ADMSendResult@1.0".to_string(),
                ),
            ],
            rate_limit_status: 429,
            push_endpoint: PushEndpoint::Template(ADM_PUSH_URL_TEMPLATE.to_string()),
            messages: StatusMessages::common("ADM"),
        }
    }

    /// Override the authorization endpoint
    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    /// Override how destinations map to push URLs
    pub fn with_push_endpoint(mut self, endpoint: PushEndpoint) -> Self {
        self.push_endpoint = endpoint;
        self
    }

    /// Add a header sent with every push request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

/// Client tuning knobs, deserializable from the caller's config layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout applied to every outbound request (default: 30000)
    pub request_timeout_ms: u64,
    /// Upper bound on in-flight push requests per send call (default: 1)
    pub max_concurrent_sends: usize,
    /// Refetch tokens this many seconds before they expire (default: 0)
    pub token_refresh_leeway_secs: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            max_concurrent_sends: 1,
            token_refresh_leeway_secs: 0,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn token_refresh_leeway(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.token_refresh_leeway_secs)
            .unwrap_or_else(chrono::Duration::zero)
    }

    pub fn validate(&self) -> Result<(), PushError> {
        if self.request_timeout_ms == 0 {
            return Err(PushError::Configuration(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_sends == 0 {
            return Err(PushError::Configuration(
                "max_concurrent_sends must be greater than zero".to_string(),
            ));
        }
        if self.token_refresh_leeway_secs < 0 {
            return Err(PushError::Configuration(
                "token_refresh_leeway_secs must not be negative".to_string(),
            ));
        }
        if chrono::Duration::try_seconds(self.token_refresh_leeway_secs).is_none() {
            return Err(PushError::Configuration(
                "token_refresh_leeway_secs is out of range".to_string(),
            ));
        }
        Ok(())
    }
}
