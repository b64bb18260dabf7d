use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, ServiceProfile};
use crate::credentials::Credentials;
use crate::errors::{PushError, TransportError};
use crate::outcome::{Outcome, SendResult};
use crate::token::{token_request_body, TokenCache, TokenResponse, FORM_CONTENT_TYPE};
use crate::transport::{post_with_timeout, HttpRequest, HttpTransport, ReqwestTransport};

/// Push Gateway Client
///
/// Sends raw notifications through an OAuth2-protected push gateway (WNS, ADM).
/// Manages client-credentials token acquisition, caching, and per-destination
/// delivery with status mapping.
pub struct PushClient {
    profile: ServiceProfile,
    credentials: Credentials,
    config: ClientConfig,
    token_cache: Mutex<TokenCache>,
    transport: Arc<dyn HttpTransport>,
}

impl PushClient {
    /// Create new client with default configuration
    ///
    /// # Arguments
    /// * `profile` - Gateway the client talks to
    /// * `client_id` - OAuth2 client id (package SID for WNS)
    /// * `client_secret` - OAuth2 client secret
    pub fn new(
        profile: ServiceProfile,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, PushError> {
        let credentials = Credentials::new(client_id, client_secret)?;
        Self::with_config(profile, credentials, ClientConfig::default())
    }

    /// Client for Windows Push Notification Services
    pub fn wns(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, PushError> {
        Self::new(ServiceProfile::wns(), client_id, client_secret)
    }

    /// Client for Amazon Device Messaging
    pub fn adm(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, PushError> {
        Self::new(ServiceProfile::adm(), client_id, client_secret)
    }

    pub fn with_config(
        profile: ServiceProfile,
        credentials: Credentials,
        config: ClientConfig,
    ) -> Result<Self, PushError> {
        let transport = ReqwestTransport::new().map_err(|e| {
            PushError::Configuration(format!("failed to build HTTP client: {}", e))
        })?;
        Self::with_transport(profile, credentials, config, Arc::new(transport))
    }

    /// Create client on top of a caller-supplied transport
    pub fn with_transport(
        profile: ServiceProfile,
        credentials: Credentials,
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, PushError> {
        config.validate()?;

        info!(
            "Initialized {} push client (timeout={}ms, max_concurrent_sends={})",
            profile.name, config.request_timeout_ms, config.max_concurrent_sends
        );

        Ok(Self {
            profile,
            credentials,
            config,
            token_cache: Mutex::new(TokenCache::default()),
            transport,
        })
    }

    pub fn profile(&self) -> &ServiceProfile {
        &self.profile
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send the empty payload `{}` to every destination
    pub async fn send_empty_notification<D>(
        &self,
        destinations: &[D],
    ) -> Result<SendResult, PushError>
    where
        D: AsRef<str> + Sync,
    {
        self.send_notification(destinations, &serde_json::json!({}))
            .await
    }

    /// Send a payload to each destination.
    ///
    /// Gateway rejections (4xx/5xx) come back as outcomes in the mapping.
    /// A token failure aborts before any push; a transport failure on any
    /// destination aborts the whole call and discards gathered outcomes.
    pub async fn send_notification<D, P>(
        &self,
        destinations: &[D],
        payload: &P,
    ) -> Result<SendResult, PushError>
    where
        D: AsRef<str> + Sync,
        P: Serialize + ?Sized,
    {
        if destinations.is_empty() {
            return Err(PushError::NoDestinations);
        }

        let access_token = self.ensure_access_token().await?;

        let body = serde_json::to_vec(payload)
            .map_err(|e| PushError::Notification(TransportError::Serialization(e)))?;
        let authorization = format!("Bearer {}", access_token);

        info!(
            "Sending {} notification to {} destination(s)",
            self.profile.name,
            destinations.len()
        );

        let destinations: Vec<String> = destinations
            .iter()
            .map(|d| d.as_ref().to_string())
            .collect();
        let authorization = authorization.as_str();
        let body = body.as_slice();

        let responses = stream::iter(destinations)
            .map(|destination| async move { self.push(destination, authorization, body).await })
            .buffered(self.config.max_concurrent_sends)
            .try_fold(SendResult::new(), |mut responses, (destination, outcome)| {
                responses.insert(destination, outcome);
                future::ready(Ok(responses))
            })
            .await
            .map_err(|e| {
                error!("Unexpected error sending {} notification: {}", self.profile.name, e);
                PushError::Notification(e)
            })?;

        let success_count = responses.values().filter(|o| o.is_success()).count();
        info!(
            "{} send complete: {} succeeded, {} failed",
            self.profile.name,
            success_count,
            responses.len() - success_count
        );

        Ok(responses)
    }

    async fn push(
        &self,
        destination: String,
        authorization: &str,
        body: &[u8],
    ) -> Result<(String, Outcome), TransportError> {
        let mut request = HttpRequest::post(self.profile.push_endpoint.url_for(&destination))
            .header("Authorization", authorization)
            .header("Content-Type", &self.profile.content_type)
            .body(body);
        for (name, value) in &self.profile.extra_headers {
            request = request.header(name, value);
        }

        let response =
            post_with_timeout(self.transport.as_ref(), request, self.config.request_timeout())
                .await?;
        let outcome = Outcome::from_response(&self.profile, response);

        let prefix = destination_prefix(&destination);
        if outcome.is_success() {
            debug!("{} push delivered to {}", self.profile.name, prefix);
        } else {
            warn!(
                "{} push to {} rejected: status={} reason={}",
                self.profile.name,
                prefix,
                outcome.status_code,
                outcome.reason_or_unknown()
            );
        }

        Ok((destination, outcome))
    }

    /// Return a valid bearer token, requesting one only when the cache is empty or stale.
    ///
    /// The cache lock is held across the token request, so callers sharing
    /// this client never fetch twice for the same expiry window.
    pub async fn ensure_access_token(&self) -> Result<String, PushError> {
        let mut cache = self.token_cache.lock().await;

        if let Some(token) = cache.valid_token(Utc::now(), self.config.token_refresh_leeway()) {
            debug!("Using cached {} access token", self.profile.name);
            return Ok(token.to_string());
        }

        cache.clear();

        let outcome = self.request_access_token().await?;
        if outcome.status_code != 200 {
            warn!(
                "{} access token request failed: status={} reason={}",
                self.profile.name,
                outcome.status_code,
                outcome.reason_or_unknown()
            );
            return Err(PushError::AccessKey(Box::new(outcome)));
        }

        let token = TokenResponse::from_body(&outcome.body)?;
        cache.store(&token, Utc::now())?;

        info!(
            "Obtained {} access token (expires_in={}s)",
            self.profile.name, token.expires_in
        );

        Ok(token.access_token)
    }

    /// Request a token unconditionally and return the raw outcome; the cache is untouched
    pub async fn request_access_token(&self) -> Result<Outcome, PushError> {
        let request = HttpRequest::post(&self.profile.auth_url)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(token_request_body(&self.credentials, &self.profile.scope));

        let response =
            post_with_timeout(self.transport.as_ref(), request, self.config.request_timeout())
                .await
                .map_err(PushError::TokenTransport)?;

        Ok(Outcome::from_response(&self.profile, response))
    }

    /// Drop the cached token so the next send requests a fresh one
    pub async fn invalidate_access_token(&self) {
        self.token_cache.lock().await.clear();
        debug!("Invalidated cached {} access token", self.profile.name);
    }
}

impl fmt::Debug for PushClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushClient")
            .field("profile", &self.profile.name)
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn destination_prefix(destination: &str) -> String {
    destination.chars().take(16).collect()
}
