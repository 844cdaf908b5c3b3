use std::sync::Arc;
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use vts_chat::session::check_mounts;
use vts_chat::view::BubbleLayout;
use vts_chat::{
    ChatSession, Clipboard, Config, InitializationError, PageMode, ReplyGateway, ReplyOutcome,
    Surface, SystemClipboard, WidgetMode,
};

/// Screen regions recorded during render for mouse hit-testing
#[derive(Debug, Default, Clone)]
pub struct HitAreas {
    pub page: Option<Rect>,
    pub page_transcript: Option<Rect>,
    pub fullscreen_toggle: Option<Rect>,
    pub widget: Option<Rect>,
    pub widget_transcript: Option<Rect>,
    pub float_button: Option<Rect>,
    pub close_button: Option<Rect>,
    pub expand_button: Option<Rect>,
}

pub struct App {
    pub should_quit: bool,

    // Surface modes
    pub page_mode: PageMode,
    pub widget_mode: WidgetMode,

    // One chat session per surface
    pub page: ChatSession,
    pub widget: ChatSession,

    // Surfaces that failed to mount stay inert for the session
    pub page_error: Option<InitializationError>,
    pub widget_error: Option<InitializationError>,

    pub clipboard: Box<dyn Clipboard>,
    pub endpoint: String,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Updated during render
    pub hit: HitAreas,
    pub page_layout: Vec<BubbleLayout>,
    pub widget_layout: Vec<BubbleLayout>,
}

impl App {
    pub fn new(
        config: &Config,
        gateway: Arc<dyn ReplyGateway>,
        replies: mpsc::UnboundedSender<ReplyOutcome>,
        (width, height): (u16, u16),
    ) -> Self {
        let feedback = config.copy_feedback();
        let page = ChatSession::new(Surface::Page, Arc::clone(&gateway), replies.clone(), feedback);
        let widget = ChatSession::new(Surface::Widget, gateway, replies, feedback);

        let page_error = check_mounts(Surface::Page, width, height).err();
        let widget_error = check_mounts(Surface::Widget, width, height).err();
        for err in page_error.iter().chain(widget_error.iter()) {
            tracing::error!(error = %err, "chat surface disabled");
        }

        Self {
            should_quit: false,
            page_mode: PageMode::default(),
            widget_mode: WidgetMode::default(),
            page,
            widget,
            page_error,
            widget_error,
            clipboard: Box::new(SystemClipboard::new()),
            endpoint: config.endpoint.clone(),
            animation_frame: 0,
            hit: HitAreas::default(),
            page_layout: Vec::new(),
            widget_layout: Vec::new(),
        }
    }

    pub fn page_ready(&self) -> bool {
        self.page_error.is_none()
    }

    pub fn widget_ready(&self) -> bool {
        self.widget_error.is_none()
    }

    /// Surface that receives typing: the widget while it is open
    pub fn focused_surface(&self) -> Option<Surface> {
        if self.widget_ready() && self.widget_mode.is_open() {
            Some(Surface::Widget)
        } else if self.page_ready() {
            Some(Surface::Page)
        } else {
            None
        }
    }

    pub fn focused_session(&mut self) -> Option<&mut ChatSession> {
        match self.focused_surface()? {
            Surface::Page => Some(&mut self.page),
            Surface::Widget => Some(&mut self.widget),
        }
    }

    pub fn session_mut(&mut self, surface: Surface) -> &mut ChatSession {
        match surface {
            Surface::Page => &mut self.page,
            Surface::Widget => &mut self.widget,
        }
    }

    // Page gestures

    pub fn toggle_fullscreen(&mut self) {
        if !self.page_ready() {
            return;
        }
        self.page_mode.toggle();
        self.page.follow_tail = true;
        tracing::debug!(
            fullscreen = self.page_mode.is_fullscreen(),
            title = self.page_mode.toggle_title(),
            "page toggle"
        );
    }

    pub fn escape(&mut self) {
        if self.page_ready() && self.page_mode.escape() {
            self.page.follow_tail = true;
            tracing::debug!("left fullscreen");
        }
    }

    // Widget gestures

    pub fn float_click(&mut self) {
        if !self.widget_ready() {
            return;
        }
        self.widget_mode.float_click();
        tracing::debug!(mode = ?self.widget_mode, "widget float button");
    }

    pub fn close_click(&mut self) {
        if !self.widget_ready() {
            return;
        }
        self.widget_mode.close_click();
        self.widget.pointer.left();
        tracing::debug!("widget closed");
    }

    pub fn expand_click(&mut self) {
        if !self.widget_ready() {
            return;
        }
        self.widget_mode.expand_click();
        self.widget.follow_tail = true;
        tracing::debug!(
            mode = ?self.widget_mode,
            title = self.widget_mode.expand_title(),
            "widget expand"
        );
    }

    // Messaging

    pub fn submit(&mut self) {
        if let Some(session) = self.focused_session() {
            session.submit_input();
        }
    }

    pub fn apply_reply(&mut self, outcome: ReplyOutcome) {
        let surface = outcome.surface;
        self.session_mut(surface).apply_reply(outcome);
    }

    pub async fn copy_last_reply(&mut self) {
        let Some(surface) = self.focused_surface() else {
            return;
        };
        let session = match surface {
            Surface::Page => &mut self.page,
            Surface::Widget => &mut self.widget,
        };
        session.copy_last_reply(self.clipboard.as_mut()).await;
    }

    /// Copy the bubble drawn at content line `line` of a surface's transcript
    pub async fn copy_at_line(&mut self, surface: Surface, line: usize) {
        let (session, layout) = match surface {
            Surface::Page => (&mut self.page, &self.page_layout),
            Surface::Widget => (&mut self.widget, &self.widget_layout),
        };
        if let Some(id) = vts_chat::view::bubble_at_line(layout, line) {
            session.copy_message(id, self.clipboard.as_mut()).await;
        }
    }

    /// Tick animation frame and expire feedback flags (called by Tick event)
    pub fn tick(&mut self) {
        if self.page.is_waiting() || self.widget.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.page.tick();
        self.widget.tick();
    }
}
