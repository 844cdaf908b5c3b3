use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct MessageResponse {
    reply: String,
}

/// Broad classification used to pick the user-visible failure text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Network,
    Server,
    Protocol,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("could not reach the chat server: {0}")]
    Network(String),
    #[error("chat server responded with status {0}")]
    Server(StatusCode),
    #[error("chat server sent an unreadable reply: {0}")]
    Protocol(String),
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Network(_) => GatewayErrorKind::Network,
            GatewayError::Server(_) => GatewayErrorKind::Server,
            GatewayError::Protocol(_) => GatewayErrorKind::Protocol,
        }
    }
}

/// Turns one outbound message into one reply. Implementations never retry.
#[async_trait]
pub trait ReplyGateway: Send + Sync {
    async fn send(&self, text: &str) -> Result<String, GatewayError>;
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/message", self.base_url)
    }
}

#[async_trait]
impl ReplyGateway for HttpGateway {
    async fn send(&self, text: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&MessageRequest { message: text })
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Server(response.status()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let parsed: MessageResponse =
            serde_json::from_slice(&body).map_err(|e| GatewayError::Protocol(e.to_string()))?;

        Ok(parsed.reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let gateway = HttpGateway::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(gateway.endpoint(), "http://localhost:5000/message");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(MessageRequest { message: "hello" }).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hello" }));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GatewayError::Network("refused".into()).kind(),
            GatewayErrorKind::Network
        );
        assert_eq!(
            GatewayError::Server(StatusCode::BAD_GATEWAY).kind(),
            GatewayErrorKind::Server
        );
        assert_eq!(
            GatewayError::Protocol("missing field".into()).kind(),
            GatewayErrorKind::Protocol
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let gateway = HttpGateway::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = gateway.send("hello").await.unwrap_err();
        assert_eq!(err.kind(), GatewayErrorKind::Network);
    }
}
