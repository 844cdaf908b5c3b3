//! Everything one chat surface owns: its transcript, submission pipeline,
//! input line, copy feedback and hover state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::clipboard::Clipboard;
use crate::feedback::FeedbackTimer;
use crate::gateway::ReplyGateway;
use crate::mode::{PointerTracker, Surface};
use crate::pipeline::{ReplyOutcome, Submission, SubmissionPipeline};
use crate::transcript::{MessageId, Role, Status, Transcript, TranscriptEvent};
use crate::view::{BubbleView, render_transcript};

/// A surface could not place one of its required controls
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{surface} surface is missing its {mount} ({needed_width}x{needed_height} needed, {width}x{height} available)")]
pub struct InitializationError {
    pub surface: &'static str,
    pub mount: &'static str,
    pub needed_width: u16,
    pub needed_height: u16,
    pub width: u16,
    pub height: u16,
}

/// Named mount points per surface with the minimum terminal size each needs
fn mount_points(surface: Surface) -> &'static [(&'static str, u16, u16)] {
    match surface {
        Surface::Page => &[
            ("transcript", 20, 5),
            ("input", 20, 8),
            ("fullscreen toggle", 24, 1),
        ],
        // Sized for the smallest tier: a quarter of the width, half the height
        Surface::Widget => &[
            ("float button", 12, 3),
            ("close button", 48, 10),
            ("expand button", 56, 10),
            ("transcript", 56, 12),
            ("input", 56, 16),
        ],
    }
}

/// Check that every mount point of `surface` fits a `width` x `height` host.
pub fn check_mounts(surface: Surface, width: u16, height: u16) -> Result<(), InitializationError> {
    for &(mount, needed_width, needed_height) in mount_points(surface) {
        if width < needed_width || height < needed_height {
            return Err(InitializationError {
                surface: surface.as_str(),
                mount,
                needed_width,
                needed_height,
                width,
                height,
            });
        }
    }
    Ok(())
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct ChatSession {
    pub surface: Surface,
    pub transcript: Transcript,
    pub pipeline: SubmissionPipeline,
    pub input: String,
    pub cursor: usize,
    pub feedback: FeedbackTimer<MessageId>,
    pub pointer: PointerTracker,
    /// First visible transcript line
    pub scroll: usize,
    /// Keep the newest line in view
    pub follow_tail: bool,
    appended: Arc<AtomicBool>,
}

impl ChatSession {
    pub fn new(
        surface: Surface,
        gateway: Arc<dyn ReplyGateway>,
        outcomes: mpsc::UnboundedSender<ReplyOutcome>,
        feedback_duration: Duration,
    ) -> Self {
        let mut transcript = Transcript::new();
        let appended = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&appended);
        transcript.subscribe(move |event| {
            if let TranscriptEvent::Appended(_) = event {
                flag.store(true, Ordering::Relaxed);
            }
        });

        Self {
            surface,
            transcript,
            pipeline: SubmissionPipeline::new(surface, gateway, outcomes),
            input: String::new(),
            cursor: 0,
            feedback: FeedbackTimer::new(feedback_duration),
            pointer: PointerTracker::default(),
            scroll: 0,
            follow_tail: true,
            appended,
        }
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor < char_count {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Messaging

    /// Submit the input line. It is cleared once the user's message is in the
    /// transcript, whatever later happens to the reply.
    pub fn submit_input(&mut self) -> Submission {
        let submission = self.pipeline.submit(&mut self.transcript, &self.input);
        if let Submission::Dispatched { .. } = submission {
            self.input.clear();
            self.cursor = 0;
        }
        submission
    }

    pub fn apply_reply(&mut self, outcome: ReplyOutcome) {
        let message_id = outcome.message_id;
        if let Err(err) = self.pipeline.settle(&mut self.transcript, outcome) {
            tracing::warn!(
                surface = self.surface.as_str(),
                message = %message_id,
                error = %err,
                "could not apply reply"
            );
        }
    }

    /// Copy a bubble's text and flash its "copied" badge. Clipboard failures
    /// are logged and leave the badge off.
    pub async fn copy_message(&mut self, id: MessageId, clipboard: &mut dyn Clipboard) -> bool {
        let text = match self.transcript.get(id) {
            Some(message) if message.status != Status::Pending => message.text.trim().to_string(),
            _ => return false,
        };

        match clipboard.copy(&text).await {
            Ok(()) => {
                self.feedback.trigger(id);
                true
            }
            Err(err) => {
                tracing::warn!(
                    surface = self.surface.as_str(),
                    message = %id,
                    error = %err,
                    "copy to clipboard failed"
                );
                false
            }
        }
    }

    pub async fn copy_last_reply(&mut self, clipboard: &mut dyn Clipboard) -> bool {
        match self.transcript.last_delivered(Role::Bot).map(|m| m.id) {
            Some(id) => self.copy_message(id, clipboard).await,
            None => false,
        }
    }

    /// Clear expired feedback flags; true when something changed.
    pub fn tick(&mut self) -> bool {
        !self.feedback.sweep().is_empty()
    }

    pub fn view(&self, now: Instant) -> Vec<BubbleView> {
        render_transcript(&self.transcript, &self.feedback, now)
    }

    pub fn is_waiting(&self) -> bool {
        self.pipeline.is_waiting()
    }

    // Scrolling

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    /// Resolve the scroll offset for a viewport of `height` lines over `total`
    /// lines. New messages snap back to the bottom.
    pub fn clamp_scroll(&mut self, total: usize, height: usize) -> usize {
        if self.appended.swap(false, Ordering::Relaxed) {
            self.follow_tail = true;
        }
        let max_scroll = total.saturating_sub(height);
        if self.follow_tail || self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.follow_tail = true;
        }
        self.scroll
    }
}
