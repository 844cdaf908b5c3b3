//! Contract tests for the `/message` reply endpoint.
//!
//! A mock server stands in for the reply service so request shape, reply
//! parsing and failure classification can be checked over real HTTP.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use vts_chat::{
    GatewayErrorKind, HttpGateway, ReplyGateway, Role, Status, Submission, Surface,
    SubmissionPipeline, Transcript,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Request format
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_posts_json_message_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "message": "When is advising?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "Monday" })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = gateway(&server).send("When is advising?").await.unwrap();
    assert_eq!(reply, "Monday");
}

// ────────────────────────────────────────────────────────────────────────────
// Response parsing
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reply_is_trimmed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "reply": "\n  Hello there!  \n" })),
        )
        .mount(&server)
        .await;

    assert_eq!(gateway(&server).send("hi").await.unwrap(), "Hello there!");
}

#[tokio::test]
async fn test_missing_reply_field_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "wrong key" })))
        .mount(&server)
        .await;

    let err = gateway(&server).send("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::Protocol);
}

#[tokio::test]
async fn test_non_json_body_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = gateway(&server).send("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::Protocol);
}

#[tokio::test]
async fn test_non_string_reply_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": 42 })))
        .mount(&server)
        .await;

    let err = gateway(&server).send("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::Protocol);
}

// ────────────────────────────────────────────────────────────────────────────
// Error handling
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_2xx_is_server_error_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "reply": "ignored" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server).send("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::Server);
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_slow_server_is_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "reply": "too late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let err = gateway.send("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::Network);
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline over HTTP
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_trigger_fail_yields_one_failed_bot_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .and(body_json(json!({ "message": "trigger-fail" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut pipeline = SubmissionPipeline::new(Surface::Page, Arc::new(gateway(&server)), tx);
    let mut transcript = Transcript::new();

    let submission = pipeline.submit(&mut transcript, "trigger-fail");
    assert!(matches!(submission, Submission::Dispatched { .. }));

    let outcome = rx.recv().await.unwrap();
    pipeline.settle(&mut transcript, outcome).unwrap();

    let bots: Vec<_> = transcript
        .messages()
        .iter()
        .filter(|m| m.role == Role::Bot)
        .collect();
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].status, Status::Failed);
    assert_eq!(transcript.messages()[0].status, Status::Delivered);
    assert_eq!(pipeline.in_flight(), 0);
}

#[tokio::test]
async fn test_conversation_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .and(body_json(json!({ "message": "Hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "Hi!" })))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut pipeline = SubmissionPipeline::new(Surface::Widget, Arc::new(gateway(&server)), tx);
    let mut transcript = Transcript::new();

    pipeline.submit(&mut transcript, "  Hi ");
    let outcome = rx.recv().await.unwrap();
    assert_eq!(outcome.surface, Surface::Widget);
    pipeline.settle(&mut transcript, outcome).unwrap();

    let texts: Vec<(&str, Status)> = transcript
        .messages()
        .iter()
        .map(|m| (m.text.as_str(), m.status))
        .collect();
    assert_eq!(texts, vec![("Hi", Status::Delivered), ("Hi!", Status::Delivered)]);
}
