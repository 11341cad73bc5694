use location_relay::config::SendGridConfig;
use location_relay::services::{EmailMessage, EmailProvider, ProviderError, SendGridProvider, Sender};
use secrecy::Secret;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(base_url: &str, timeout_secs: u64) -> SendGridProvider {
    SendGridProvider::new(&SendGridConfig {
        api_key: Secret::new("SG.test-key".to_string()),
        api_base_url: base_url.to_string(),
        timeout_secs,
    })
    .expect("Failed to build provider")
}

fn message() -> EmailMessage {
    EmailMessage {
        to: "owner@example.com".to_string(),
        from: Sender {
            email: "relay@example.com".to_string(),
            name: Some("Location Relay".to_string()),
        },
        reply_to: Some("owner@example.com".to_string()),
        subject: "📍 Localização recebida (ABC123)".to_string(),
        body: "Token: ABC123\nLatitude: -23.55".to_string(),
    }
}

#[tokio::test]
async fn posts_bearer_authenticated_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer SG.test-key"))
        .and(body_json(json!({
            "personalizations": [{ "to": [{ "email": "owner@example.com" }] }],
            "from": { "email": "relay@example.com", "name": "Location Relay" },
            "reply_to": { "email": "owner@example.com" },
            "subject": "📍 Localização recebida (ABC123)",
            "content": [{ "type": "text/plain", "value": "Token: ABC123 Latitude: -23.55" }]
        })))
        .respond_with(ResponseTemplate::new(202).insert_header("x-message-id", "msg-1"))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server.uri(), 5)
        .send(&message())
        .await
        .expect("send should succeed");

    assert_eq!(response.provider_id.as_deref(), Some("msg-1"));
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let server = MockServer::start().await;
    let provider = provider(&format!("{}/", server.uri()), 5);
    assert_eq!(provider.endpoint(), format!("{}/v3/mail/send", server.uri()));
}

#[tokio::test]
async fn rejection_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"errors":[{"message":"The provided authorization grant is invalid"}]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server.uri(), 5)
        .send(&message())
        .await
        .expect_err("send should fail");

    match err {
        ProviderError::Rejected { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("authorization grant is invalid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn one_attempt_only_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server.uri(), 5).send(&message()).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn slow_provider_hits_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = provider(&server.uri(), 1).send(&message()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Connection(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn sanitized_payload_reaches_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let mut email = message();
    email.subject = format!("line\r\nBcc: x@example.com{}", "s".repeat(300));
    provider(&server.uri(), 5).send(&email).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let subject = body["subject"].as_str().unwrap();
    assert!(subject.starts_with("line Bcc: x@example.com"));
    assert_eq!(subject.chars().count(), 200);
    assert!(!String::from_utf8_lossy(&requests[0].body).contains("\\n"));
}

#[test]
fn empty_api_key_is_rejected() {
    let result = SendGridProvider::new(&SendGridConfig {
        api_key: Secret::new(String::new()),
        api_base_url: "https://api.sendgrid.com".to_string(),
        timeout_secs: 10,
    });
    assert!(matches!(result, Err(ProviderError::Configuration(_))));
}

#[test]
fn zero_timeout_is_rejected() {
    let result = SendGridProvider::new(&SendGridConfig {
        api_key: Secret::new("SG.test-key".to_string()),
        api_base_url: "https://api.sendgrid.com".to_string(),
        timeout_secs: 0,
    });
    assert!(matches!(result, Err(ProviderError::Configuration(_))));
}
