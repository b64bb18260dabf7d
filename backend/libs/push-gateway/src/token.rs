use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::credentials::Credentials;
use crate::errors::PushError;

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// OAuth2 client-credentials token response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

impl TokenResponse {
    pub(crate) fn from_body(body: &Value) -> Result<Self, PushError> {
        serde_json::from_value(body.clone())
            .map_err(|e| PushError::InvalidTokenResponse(e.to_string()))
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// In-memory bearer token with its expiry instant
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    current: Option<CachedToken>,
}

impl TokenCache {
    /// Token still valid `leeway` from `now`, if any
    pub(crate) fn valid_token(&self, now: DateTime<Utc>, leeway: Duration) -> Option<&str> {
        // A deadline past the representable range counts as already stale
        let deadline = now.checked_add_signed(leeway)?;
        self.current
            .as_ref()
            .filter(|cached| deadline < cached.expires_at)
            .map(|cached| cached.access_token.as_str())
    }

    pub(crate) fn store(
        &mut self,
        response: &TokenResponse,
        now: DateTime<Utc>,
    ) -> Result<(), PushError> {
        let expires_at = Duration::try_seconds(response.expires_in)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                PushError::InvalidTokenResponse(format!(
                    "expires_in out of range: {}",
                    response.expires_in
                ))
            })?;

        self.current = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at,
        });
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.current = None;
    }
}

/// Form-url-encoded client-credentials grant
pub(crate) fn token_request_body(credentials: &Credentials, scope: &str) -> String {
    [
        ("grant_type", "client_credentials"),
        ("scope", scope),
        ("client_id", credentials.client_id()),
        ("client_secret", credentials.client_secret()),
    ]
    .iter()
    .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
    .collect::<Vec<_>>()
    .join("&")
}
