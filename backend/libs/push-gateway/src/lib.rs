//! Push Gateway Client Library
//!
//! This library provides a client for OAuth2-protected push notification
//! gateways: Microsoft Windows Push Notification Services (WNS) and
//! Amazon Device Messaging (ADM).
//!
//! It handles:
//! - OAuth2 client-credentials token acquisition
//! - Token caching with refresh on expiry
//! - Raw payload delivery to one or more destinations
//! - Mapping gateway status codes to structured outcomes
//!
//! # Example
//!
//! ```rust,no_run
//! use push_gateway::PushClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), push_gateway::PushError> {
//!     let client = PushClient::wns("ms-app://s-1-15-2-...", "client-secret")?;
//!
//!     let responses = client
//!         .send_notification(
//!             &["https://db5.notify.windows.com/?token=AwYAAAB..."],
//!             &serde_json::json!({ "score": "5x1" }),
//!         )
//!         .await?;
//!
//!     for (channel, outcome) in &responses {
//!         if !outcome.is_success() {
//!             eprintln!("{}: {} ({})", channel, outcome.message, outcome.reason_or_unknown());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod outcome;
mod token;
pub mod transport;

pub use client::PushClient;
pub use config::{ClientConfig, PushEndpoint, ServiceProfile, StatusMessages};
pub use credentials::Credentials;
pub use errors::{PushError, TransportError};
pub use outcome::{Outcome, OutcomeCategory, SendResult};
pub use token::TokenResponse;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
