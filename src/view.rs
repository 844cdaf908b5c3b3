//! Pure projection of a transcript into renderable bubbles.
//!
//! Nothing here touches the terminal, so the same view tree can be asserted
//! on directly in tests.

use tokio::time::Instant;

use crate::feedback::FeedbackTimer;
use crate::transcript::{MessageId, Role, Status, Transcript};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleView {
    pub id: MessageId,
    pub role: Role,
    pub status: Status,
    pub text: String,
    /// "Copied" badge is showing
    pub copied: bool,
}

impl BubbleView {
    pub fn label(&self) -> &'static str {
        match (self.role, self.status) {
            (Role::User, _) => "You",
            (Role::Bot, Status::Failed) => "Bot (failed)",
            (Role::Bot, _) => "Bot",
        }
    }
}

pub fn render_transcript(
    transcript: &Transcript,
    feedback: &FeedbackTimer<MessageId>,
    now: Instant,
) -> Vec<BubbleView> {
    transcript
        .messages()
        .iter()
        .map(|message| BubbleView {
            id: message.id,
            role: message.role,
            status: message.status,
            text: message.text.clone(),
            copied: feedback.is_active_at(&message.id, now),
        })
        .collect()
}

/// Line span one bubble occupies once wrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleLayout {
    pub id: MessageId,
    pub start_line: usize,
    /// Label line plus body lines, excluding the blank separator
    pub line_count: usize,
    pub body: Vec<String>,
}

/// Wrap text to fit within a given width on word boundaries, keeping
/// explicit line breaks
pub fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > width {
                // Hard-break words that can never fit, e.g. long URLs
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current_line));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(width).map(|c| c.iter().collect::<String>());
                let mut last = chunks.next().unwrap_or_default();
                for chunk in chunks {
                    lines.push(std::mem::replace(&mut last, chunk));
                }
                current_len = last.chars().count();
                current_line = last;
            } else if current_len == 0 {
                current_line = word.to_string();
                current_len = word_len;
            } else if current_len + 1 + word_len <= width {
                current_line.push(' ');
                current_line.push_str(word);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = word.to_string();
                current_len = word_len;
            }
        }
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Stack bubbles top to bottom with a blank line between them.
/// Pending bubbles reserve one body line for the progress indicator.
pub fn layout_bubbles(bubbles: &[BubbleView], width: usize) -> Vec<BubbleLayout> {
    let mut layouts = Vec::with_capacity(bubbles.len());
    let mut line = 0;

    for bubble in bubbles {
        let body = if bubble.status == Status::Pending {
            vec![String::new()]
        } else {
            wrap_text_to_width(&bubble.text, width)
        };
        let line_count = body.len() + 1;
        layouts.push(BubbleLayout {
            id: bubble.id,
            start_line: line,
            line_count,
            body,
        });
        line += line_count + 1;
    }

    layouts
}

/// Total lines the laid-out transcript needs, separators included
pub fn total_lines(layouts: &[BubbleLayout]) -> usize {
    layouts
        .last()
        .map(|last| last.start_line + last.line_count)
        .unwrap_or(0)
}

/// Bubble under content line `line`, if any
pub fn bubble_at_line(layouts: &[BubbleLayout], line: usize) -> Option<MessageId> {
    layouts
        .iter()
        .find(|l| line >= l.start_line && line < l.start_line + l.line_count)
        .map(|l| l.id)
}
