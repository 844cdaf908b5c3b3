pub mod clipboard;
pub mod config;
pub mod feedback;
pub mod gateway;
pub mod logging;
pub mod mode;
pub mod pipeline;
pub mod session;
pub mod transcript;
pub mod view;

// Re-export main types for convenience
pub use clipboard::{Clipboard, ClipboardError, SystemClipboard};
pub use config::Config;
pub use feedback::FeedbackTimer;
pub use gateway::{GatewayError, GatewayErrorKind, HttpGateway, ReplyGateway};
pub use mode::{PageMode, Pointer, PointerTracker, SizeTier, Surface, WidgetMode};
pub use pipeline::{PendingRequest, ReplyOutcome, Submission, SubmissionPipeline};
pub use session::{ChatSession, InitializationError};
pub use transcript::{Message, MessageId, Role, Status, Transcript, TranscriptError, TranscriptEvent};
pub use view::{BubbleView, render_transcript};
