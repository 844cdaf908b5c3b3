//! Message submission: echo the user's text, park a bot placeholder, ask the
//! gateway in the background and settle the placeholder when the answer (or
//! failure) comes back through the host's event queue.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::gateway::{GatewayError, GatewayErrorKind, ReplyGateway};
use crate::mode::Surface;
use crate::transcript::{MessageId, Role, Status, Transcript, TranscriptError};

/// A reply that is still outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub message_id: MessageId,
    pub started_at: Instant,
}

/// What `submit` did with the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; nothing was recorded
    Ignored,
    Dispatched {
        user_id: MessageId,
        request: PendingRequest,
    },
}

/// Result of one gateway round trip, bound to the placeholder it fills
#[derive(Debug)]
pub struct ReplyOutcome {
    pub surface: Surface,
    pub message_id: MessageId,
    pub started_at: Instant,
    pub result: Result<String, GatewayError>,
}

pub struct SubmissionPipeline {
    surface: Surface,
    gateway: Arc<dyn ReplyGateway>,
    outcomes: mpsc::UnboundedSender<ReplyOutcome>,
    in_flight: HashMap<MessageId, PendingRequest>,
}

impl SubmissionPipeline {
    pub fn new(
        surface: Surface,
        gateway: Arc<dyn ReplyGateway>,
        outcomes: mpsc::UnboundedSender<ReplyOutcome>,
    ) -> Self {
        Self {
            surface,
            gateway,
            outcomes,
            in_flight: HashMap::new(),
        }
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_waiting(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Record `raw_text` and dispatch it. Must be called inside a tokio runtime.
    pub fn submit(&mut self, transcript: &mut Transcript, raw_text: &str) -> Submission {
        let text = raw_text.trim();
        if text.is_empty() {
            tracing::debug!(surface = self.surface.as_str(), "ignoring blank submission");
            return Submission::Ignored;
        }

        let user_id = transcript.append(Role::User, text, Status::Delivered).id;
        let message_id = transcript.append(Role::Bot, "", Status::Pending).id;
        let request = PendingRequest {
            message_id,
            started_at: Instant::now(),
        };
        self.in_flight.insert(message_id, request);

        tracing::info!(
            surface = self.surface.as_str(),
            message = %message_id,
            chars = text.chars().count(),
            "dispatching message"
        );

        let gateway = Arc::clone(&self.gateway);
        let outcomes = self.outcomes.clone();
        let surface = self.surface;
        let text = text.to_string();
        tokio::spawn(async move {
            let outcome = fetch_reply(gateway, surface, request, text).await;
            if outcomes.send(outcome).is_err() {
                tracing::debug!("reply arrived after the event queue closed");
            }
        });

        Submission::Dispatched { user_id, request }
    }

    /// Fill the placeholder named by `outcome`.
    pub fn settle(
        &mut self,
        transcript: &mut Transcript,
        outcome: ReplyOutcome,
    ) -> Result<(), TranscriptError> {
        if self.in_flight.remove(&outcome.message_id).is_none() {
            tracing::warn!(
                surface = self.surface.as_str(),
                message = %outcome.message_id,
                "reply for a message that is not in flight"
            );
        }
        let elapsed_ms = outcome.started_at.elapsed().as_millis() as u64;

        match outcome.result {
            Ok(reply) => {
                tracing::info!(
                    surface = self.surface.as_str(),
                    message = %outcome.message_id,
                    elapsed_ms,
                    "reply delivered"
                );
                transcript.update_status(outcome.message_id, Status::Delivered, Some(reply))
            }
            Err(err) => {
                tracing::warn!(
                    surface = self.surface.as_str(),
                    message = %outcome.message_id,
                    kind = ?err.kind(),
                    elapsed_ms,
                    error = %err,
                    "reply failed"
                );
                transcript.update_status(
                    outcome.message_id,
                    Status::Failed,
                    Some(failure_text(&err).to_string()),
                )
            }
        }
    }
}

async fn fetch_reply(
    gateway: Arc<dyn ReplyGateway>,
    surface: Surface,
    request: PendingRequest,
    text: String,
) -> ReplyOutcome {
    // A panicking gateway still has to settle its placeholder
    let result = AssertUnwindSafe(gateway.send(&text))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            tracing::error!(
                surface = surface.as_str(),
                message = %request.message_id,
                "reply request aborted by a panic"
            );
            Err(GatewayError::Network("request aborted".to_string()))
        });
    ReplyOutcome {
        surface,
        message_id: request.message_id,
        started_at: request.started_at,
        result,
    }
}

/// Text shown in a failed bot bubble
pub fn failure_text(err: &GatewayError) -> &'static str {
    match err.kind() {
        GatewayErrorKind::Network => "Couldn't reach the chat server. Check your connection and try again.",
        GatewayErrorKind::Server => "The chat server ran into a problem. Please try again in a moment.",
        GatewayErrorKind::Protocol => "The chat server sent a reply that couldn't be read.",
    }
}
