use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use vts_chat::Surface;
use crate::app::App;
use crate::tui::AppEvent;

const SCROLL_STEP: usize = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse).await,
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Reply(outcome) => app.apply_reply(outcome),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys
    if ctrl {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('f') => app.toggle_fullscreen(),
            // Shortcut for the float button, which only exists while closed
            KeyCode::Char('o') if app.widget_mode.float_button_visible() => app.float_click(),
            KeyCode::Char('w') => app.close_click(),
            KeyCode::Char('e') => app.expand_click(),
            KeyCode::Char('y') => app.copy_last_reply().await,
            _ => {}
        }
        return;
    }

    if key.code == KeyCode::Esc {
        app.escape();
        return;
    }

    if key.code == KeyCode::Enter {
        app.submit();
        return;
    }

    let Some(session) = app.focused_session() else {
        return;
    };
    match key.code {
        KeyCode::Backspace => session.backspace(),
        KeyCode::Delete => session.delete(),
        KeyCode::Left => session.cursor_left(),
        KeyCode::Right => session.cursor_right(),
        KeyCode::Home => session.cursor_home(),
        KeyCode::End => session.cursor_end(),
        KeyCode::PageUp => session.scroll_up(SCROLL_STEP * 3),
        KeyCode::PageDown => session.scroll_down(SCROLL_STEP * 3),
        KeyCode::Char(c) => session.insert_char(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn hit(area: Option<Rect>, x: u16, y: u16) -> bool {
    area.map(|r| point_in_rect(x, y, r)).unwrap_or(false)
}

async fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // The widget floats above the page, so it wins overlapping hits
    let over = if hit(app.hit.widget, x, y) {
        Some(Surface::Widget)
    } else if hit(app.hit.page, x, y) {
        Some(Surface::Page)
    } else {
        None
    };

    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => track_pointer(app, over, x, y),
        MouseEventKind::Down(MouseButton::Left) => handle_click(app, x, y).await,
        MouseEventKind::ScrollDown => {
            if let Some(surface) = over {
                app.session_mut(surface).scroll_down(SCROLL_STEP);
            }
        }
        MouseEventKind::ScrollUp => {
            if let Some(surface) = over {
                app.session_mut(surface).scroll_up(SCROLL_STEP);
            }
        }
        _ => {}
    }
}

fn track_pointer(app: &mut App, over: Option<Surface>, x: u16, y: u16) {
    match over {
        Some(Surface::Widget) => {
            if let Some(area) = app.hit.widget {
                app.widget.pointer.moved(x - area.x, y - area.y);
            }
            app.page.pointer.left();
        }
        Some(Surface::Page) => {
            if let Some(area) = app.hit.page {
                app.page.pointer.moved(x - area.x, y - area.y);
            }
            app.widget.pointer.left();
        }
        None => {
            app.page.pointer.left();
            app.widget.pointer.left();
        }
    }
}

async fn handle_click(app: &mut App, x: u16, y: u16) {
    if hit(app.hit.float_button, x, y) {
        app.float_click();
    } else if hit(app.hit.close_button, x, y) {
        app.close_click();
    } else if hit(app.hit.expand_button, x, y) {
        app.expand_click();
    } else if hit(app.hit.fullscreen_toggle, x, y) {
        app.toggle_fullscreen();
    } else if let Some(area) = app.hit.widget_transcript.filter(|r| point_in_rect(x, y, *r)) {
        let line = app.widget.scroll + (y - area.y) as usize;
        app.copy_at_line(Surface::Widget, line).await;
    } else if let Some(area) = app.hit.page_transcript.filter(|r| point_in_rect(x, y, *r)) {
        // Ignore page clicks that land under the open widget
        if !hit(app.hit.widget, x, y) {
            let line = app.page.scroll + (y - area.y) as usize;
            app.copy_at_line(Surface::Page, line).await;
        }
    }
}
