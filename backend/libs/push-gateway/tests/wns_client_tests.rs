//! WNS client tests against a local mock gateway
use std::sync::Arc;
use std::time::Duration;

use push_gateway::{
    ClientConfig, Credentials, OutcomeCategory, PushClient, PushError, ReqwestTransport,
    ServiceProfile, TransportError,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_ID: &str = "ms-app://s-1-15-2-2411381248-444863693-3819932088";
const CLIENT_SECRET: &str = "XEvcmc5Ysh3KWXHsVtxS6fJv5pUDjyCE";
const ACCESS_TOKEN: &str = "EgAcAQMAAAAALYAAY/c+Huwi3Fv4Ck10UrKNmtxRO6Njk2MgA=";

fn client_for(server: &MockServer, config: ClientConfig) -> PushClient {
    let profile = ServiceProfile::wns().with_auth_url(format!("{}/accesstoken.srf", server.uri()));
    let credentials = Credentials::new(CLIENT_ID, CLIENT_SECRET).unwrap();
    let transport = Arc::new(ReqwestTransport::new().unwrap());
    PushClient::with_transport(profile, credentials, config, transport).unwrap()
}

async fn mount_token(server: &MockServer, expires_in: i64, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/accesstoken.srf"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=notify.windows.com"))
        .and(body_string_contains("client_secret=XEvcmc5Ysh3KWXHsVtxS6fJv5pUDjyCE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": expires_in,
            "token_type": "bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn channel(server: &MockServer, name: &str) -> String {
    format!("{}/{}", server.uri(), name)
}

#[test]
fn test_construction_requires_credentials() {
    assert!(matches!(
        PushClient::wns("", CLIENT_SECRET),
        Err(PushError::Configuration(_))
    ));
    assert!(matches!(
        PushClient::wns(CLIENT_ID, ""),
        Err(PushError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_send_raw_notification() {
    let server = MockServer::start().await;
    mount_token(&server, 86400, 1).await;

    Mock::given(method("POST"))
        .and(path("/channel-1"))
        .and(header("Authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
        .and(header("Content-Type", "application/octet-stream"))
        .and(header("X-WNS-Type", "wns/raw"))
        .and(body_json(json!({ "score": "5x1", "time": "15:10" })))
        .respond_with(ResponseTemplate::new(200).insert_header("X-WNS-Status", "received"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let destination = channel(&server, "channel-1");
    let responses = client
        .send_notification(&[destination.clone()], &json!({ "score": "5x1", "time": "15:10" }))
        .await
        .unwrap();

    let outcome = &responses[&destination];
    assert_eq!(outcome.category, OutcomeCategory::Success);
    assert_eq!(outcome.status_code, 200);
    assert_eq!(outcome.body, json!({}));
    assert!(outcome.reason.is_none());
    assert_eq!(
        outcome.headers.get("x-wns-status").map(String::as_str),
        Some("received")
    );
}

#[tokio::test]
async fn test_token_reused_within_validity_window() {
    let server = MockServer::start().await;
    mount_token(&server, 86400, 1).await;

    Mock::given(method("POST"))
        .and(path("/channel-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let destinations = [channel(&server, "channel-1")];

    client.send_empty_notification(&destinations).await.unwrap();
    client.send_empty_notification(&destinations).await.unwrap();
}

#[tokio::test]
async fn test_expired_token_refetched_before_push() {
    let server = MockServer::start().await;
    mount_token(&server, 0, 2).await;

    Mock::given(method("POST"))
        .and(path("/channel-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let destinations = [channel(&server, "channel-1")];

    client.send_empty_notification(&destinations).await.unwrap();
    client.send_empty_notification(&destinations).await.unwrap();
}

#[tokio::test]
async fn test_refresh_leeway_treats_short_lived_token_as_stale() {
    let server = MockServer::start().await;
    mount_token(&server, 30, 2).await;

    let config = ClientConfig {
        token_refresh_leeway_secs: 60,
        ..Default::default()
    };
    let client = client_for(&server, config);

    client.ensure_access_token().await.unwrap();
    client.ensure_access_token().await.unwrap();
}

#[tokio::test]
async fn test_token_rejection_raises_access_key_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accesstoken.srf"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "reason": "UNAUTHORIZED_CLIENT" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/channel-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let err = client
        .send_empty_notification(&[channel(&server, "channel-1")])
        .await
        .unwrap_err();

    match err {
        PushError::AccessKey(outcome) => {
            assert_eq!(outcome.status_code, 400);
            assert_eq!(outcome.category, OutcomeCategory::InvalidRequest);
            assert_eq!(outcome.reason.as_deref(), Some("UNAUTHORIZED_CLIENT"));
        }
        other => panic!("expected AccessKey error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mixed_outcomes_are_reported_per_channel() {
    let server = MockServer::start().await;
    mount_token(&server, 86400, 1).await;

    Mock::given(method("POST"))
        .and(path("/channel-ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/channel-expired"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "reason": "AccessTokenExpired" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let ok = channel(&server, "channel-ok");
    let expired = channel(&server, "channel-expired");

    let responses = client
        .send_empty_notification(&[ok.clone(), expired.clone()])
        .await
        .unwrap();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[&ok].category, OutcomeCategory::Success);
    assert_eq!(responses[&ok].body, json!({}));

    let rejected = &responses[&expired];
    assert_eq!(rejected.category, OutcomeCategory::AuthTokenInvalid);
    assert_eq!(rejected.message, "Access token expired");
    assert_eq!(rejected.status_code, 401);
    assert_eq!(rejected.reason.as_deref(), Some("AccessTokenExpired"));
}

#[tokio::test]
async fn test_status_table() {
    let server = MockServer::start().await;
    mount_token(&server, 86400, 1).await;

    let cases: [(u16, OutcomeCategory, &str); 8] = [
        (400, OutcomeCategory::InvalidRequest, "Wrong headers"),
        (403, OutcomeCategory::AuthTokenInvalid, "Invalid token"),
        (404, OutcomeCategory::NotFound, "Invalid token"),
        (406, OutcomeCategory::RateLimited, "Exceeded maximum allowable rate of messages"),
        (413, OutcomeCategory::PayloadTooLarge, "Payload is too large"),
        (500, OutcomeCategory::ServerError, "There was an internal error in the WNS server"),
        (503, OutcomeCategory::ServerUnavailable, "Server is temporarily unavailable"),
        (410, OutcomeCategory::Unknown, "Unexpected response from the WNS server"),
    ];

    let mut destinations = Vec::new();
    for (status, _, _) in &cases {
        let name = format!("status-{}", status);
        Mock::given(method("POST"))
            .and(path(format!("/{}", name)))
            .respond_with(ResponseTemplate::new(*status).set_body_string(""))
            .mount(&server)
            .await;
        destinations.push(channel(&server, &name));
    }

    let client = client_for(&server, ClientConfig::default());
    let responses = client.send_empty_notification(&destinations).await.unwrap();

    for (destination, (status, category, message)) in destinations.iter().zip(cases) {
        let outcome = &responses[destination];
        assert_eq!(outcome.status_code, status);
        assert_eq!(outcome.category, category, "status {}", status);
        assert_eq!(outcome.message, message, "status {}", status);
        assert_eq!(outcome.reason.as_deref(), Some("unknown"), "status {}", status);
        assert_eq!(outcome.body, json!({}));
    }
}

#[tokio::test]
async fn test_unreachable_channel_aborts_send() {
    let server = MockServer::start().await;
    mount_token(&server, 86400, 1).await;

    Mock::given(method("POST"))
        .and(path("/channel-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::default());
    let result = client
        .send_empty_notification(&[
            channel(&server, "channel-1"),
            "http://127.0.0.1:1/unreachable".to_string(),
        ])
        .await;

    assert!(matches!(
        result,
        Err(PushError::Notification(TransportError::Request(_)))
    ));
}

#[tokio::test]
async fn test_slow_channel_times_out() {
    let server = MockServer::start().await;
    mount_token(&server, 86400, 1).await;

    Mock::given(method("POST"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let config = ClientConfig {
        request_timeout_ms: 100,
        ..Default::default()
    };
    let client = client_for(&server, config);
    let result = client
        .send_empty_notification(&[channel(&server, "slow")])
        .await;

    assert!(matches!(
        result,
        Err(PushError::Notification(TransportError::Timeout(_)))
    ));
}

#[tokio::test]
async fn test_concurrent_sends_match_sequential_results() {
    let server = MockServer::start().await;
    mount_token(&server, 86400, 1).await;

    let mut destinations = Vec::new();
    for i in 0..8 {
        let status: u16 = if i % 3 == 0 { 503 } else { 200 };
        let name = format!("channel-{}", i);
        Mock::given(method("POST"))
            .and(path(format!("/{}", name)))
            .respond_with(
                ResponseTemplate::new(status).set_delay(Duration::from_millis(20)),
            )
            .expect(1)
            .mount(&server)
            .await;
        destinations.push(channel(&server, &name));
    }

    let config = ClientConfig {
        max_concurrent_sends: 4,
        ..Default::default()
    };
    let client = client_for(&server, config);
    let responses = client.send_empty_notification(&destinations).await.unwrap();

    assert_eq!(responses.len(), 8);
    for (i, destination) in destinations.iter().enumerate() {
        let expected = if i % 3 == 0 {
            OutcomeCategory::ServerUnavailable
        } else {
            OutcomeCategory::Success
        };
        assert_eq!(responses[destination].category, expected);
    }
}
