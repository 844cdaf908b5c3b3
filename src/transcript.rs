//! Session transcript: the ordered, append-only log of chat messages.
//!
//! Ordinals are handed out by the store and are never reused. The only
//! in-place change a message ever sees is the single move out of
//! [`Status::Pending`], which fills a bot placeholder with its reply or
//! failure text.

use std::fmt;

use thiserror::Error;

/// Opaque ordinal identifying a message within one transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    pub fn ordinal(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// Delivery state of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Delivered,
    Failed,
}

impl Status {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub status: Status,
}

/// Notification sent to observers after every mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptEvent {
    Appended(MessageId),
    StatusChanged(MessageId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("message {0} not found")]
    NotFound(MessageId),
    #[error("message {0} has already settled")]
    AlreadySettled(MessageId),
    #[error("message {0} cannot move back to pending")]
    InvalidTransition(MessageId),
}

type Observer = Box<dyn FnMut(&TranscriptEvent) + Send>;

#[derive(Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_ordinal: u64,
    observers: Vec<Observer>,
}

impl fmt::Debug for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("messages", &self.messages)
            .field("next_ordinal", &self.next_ordinal)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; it is called synchronously on every mutation.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&TranscriptEvent) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Append a message, assigning it the next ordinal.
    pub fn append(&mut self, role: Role, text: impl Into<String>, status: Status) -> &Message {
        self.next_ordinal += 1;
        let id = MessageId(self.next_ordinal);
        self.messages.push(Message {
            id,
            role,
            text: text.into(),
            status,
        });
        self.notify(TranscriptEvent::Appended(id));

        // Just pushed, so the log is non-empty
        &self.messages[self.messages.len() - 1]
    }

    /// Settle a pending message, optionally replacing its text.
    pub fn update_status(
        &mut self,
        id: MessageId,
        status: Status,
        text: Option<String>,
    ) -> Result<(), TranscriptError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(TranscriptError::NotFound(id))?;

        if message.status.is_settled() {
            return Err(TranscriptError::AlreadySettled(id));
        }
        if status == Status::Pending {
            return Err(TranscriptError::InvalidTransition(id));
        }

        message.status = status;
        if let Some(text) = text {
            message.text = text;
        }
        self.notify(TranscriptEvent::StatusChanged(id));
        Ok(())
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent delivered message of the given role
    pub fn last_delivered(&self, role: Role) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == role && m.status == Status::Delivered)
    }

    fn notify(&mut self, event: TranscriptEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_append_assigns_increasing_ordinals() {
        let mut transcript = Transcript::new();
        let a = transcript.append(Role::User, "hi", Status::Delivered).id;
        let b = transcript.append(Role::Bot, "", Status::Pending).id;
        let c = transcript.append(Role::User, "again", Status::Delivered).id;

        assert!(a < b && b < c);
        assert_eq!(transcript.len(), 3);
        let ids: Vec<MessageId> = transcript.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_update_status_fills_placeholder() {
        let mut transcript = Transcript::new();
        let id = transcript.append(Role::Bot, "", Status::Pending).id;

        transcript
            .update_status(id, Status::Delivered, Some("Hello!".to_string()))
            .unwrap();

        let message = transcript.get(id).unwrap();
        assert_eq!(message.status, Status::Delivered);
        assert_eq!(message.text, "Hello!");
    }

    #[test]
    fn test_update_status_unknown_id_is_not_found() {
        let mut transcript = Transcript::new();
        transcript.append(Role::User, "hi", Status::Delivered);

        let missing = MessageId(42);
        assert_eq!(
            transcript.update_status(missing, Status::Failed, None),
            Err(TranscriptError::NotFound(missing))
        );
    }

    #[test]
    fn test_settled_message_is_immutable() {
        let mut transcript = Transcript::new();
        let id = transcript.append(Role::Bot, "", Status::Pending).id;
        transcript
            .update_status(id, Status::Failed, Some("offline".to_string()))
            .unwrap();

        let result = transcript.update_status(id, Status::Delivered, Some("late".to_string()));
        assert_eq!(result, Err(TranscriptError::AlreadySettled(id)));
        assert_eq!(transcript.get(id).unwrap().text, "offline");
        assert_eq!(transcript.get(id).unwrap().status, Status::Failed);
    }

    #[test]
    fn test_cannot_move_back_to_pending() {
        let mut transcript = Transcript::new();
        let id = transcript.append(Role::Bot, "", Status::Pending).id;

        assert_eq!(
            transcript.update_status(id, Status::Pending, None),
            Err(TranscriptError::InvalidTransition(id))
        );
    }

    #[test]
    fn test_observers_see_every_mutation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut transcript = Transcript::new();
        transcript.subscribe(move |event| sink.lock().unwrap().push(*event));

        let id = transcript.append(Role::Bot, "", Status::Pending).id;
        transcript
            .update_status(id, Status::Delivered, Some("ok".to_string()))
            .unwrap();
        // Rejected updates are not mutations
        let _ = transcript.update_status(id, Status::Failed, None);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![TranscriptEvent::Appended(id), TranscriptEvent::StatusChanged(id)]
        );
    }

    #[test]
    fn test_last_delivered_skips_pending_and_failed() {
        let mut transcript = Transcript::new();
        let first = transcript.append(Role::Bot, "first", Status::Pending).id;
        transcript
            .update_status(first, Status::Delivered, Some("first".to_string()))
            .unwrap();
        let failed = transcript.append(Role::Bot, "", Status::Pending).id;
        transcript
            .update_status(failed, Status::Failed, Some("oops".to_string()))
            .unwrap();
        transcript.append(Role::Bot, "", Status::Pending);

        assert_eq!(transcript.last_delivered(Role::Bot).unwrap().id, first);
        assert!(transcript.last_delivered(Role::User).is_none());
    }
}
