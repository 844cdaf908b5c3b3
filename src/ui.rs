use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tokio::time::Instant;
use vts_chat::view::{BubbleLayout, layout_bubbles, total_lines};
use vts_chat::{BubbleView, ChatSession, PointerTracker, Role, SizeTier, Status};
use crate::app::{App, HitAreas};

/// Widest the page column gets outside fullscreen
const PAGE_MAX_WIDTH: u16 = 100;
const FLOAT_BUTTON_LABEL: &str = " Chat ";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        match after.find("**") {
            Some(close) if close > 0 => {
                if open > 0 {
                    spans.push(Span::raw(rest[..open].to_string()));
                }
                spans.push(Span::styled(
                    after[..close].to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                rest = &after[close + 2..];
            }
            // No closing **, treat as literal
            _ => break,
        }
    }
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    app.hit = HitAreas::default();

    if app.page_mode.is_fullscreen() {
        render_page(app, frame, area);
    } else {
        let [header_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        render_header(app, frame, header_area);
        let column_width = body_area.width.min(PAGE_MAX_WIDTH);
        let column = Rect::new(
            body_area.x + (body_area.width - column_width) / 2,
            body_area.y,
            column_width,
            body_area.height,
        );
        render_page(app, frame, column);
        render_footer(app, frame, footer_area);
    }

    // The widget overlays whatever the page drew
    if app.widget_ready() {
        match app.widget_mode.tier() {
            Some(tier) => render_widget(app, frame, area, tier),
            None => render_float_button(app, frame, area),
        }
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" VTS Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!(" {} ", app.endpoint), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" ^F ", key_style),
        Span::styled(format!(" {} ", app.page_mode.toggle_title()), label_style),
    ];
    if app.widget_ready() {
        if app.widget_mode.is_open() {
            hints.extend(vec![
                Span::styled(" ^E ", key_style),
                Span::styled(" resize ", label_style),
                Span::styled(" ^W ", key_style),
                Span::styled(" close widget ", label_style),
            ]);
        } else {
            hints.extend(vec![
                Span::styled(" ^O ", key_style),
                Span::styled(" open widget ", label_style),
            ]);
        }
    }
    hints.extend(vec![
        Span::styled(" ^Y ", key_style),
        Span::styled(" copy reply ", label_style),
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Border colour: dim when idle, shifting hue with the pointer while hovered
fn border_color(pointer: &PointerTracker, width: u16) -> Color {
    if !pointer.is_hovering() {
        return Color::DarkGray;
    }
    match pointer.x_percent(width) {
        0..=32 => Color::Cyan,
        33..=65 => Color::Blue,
        _ => Color::Magenta,
    }
}

/// Draw a clickable label over the top border, right-aligned with `offset`
/// columns of margin. Returns where it landed.
fn render_border_button(frame: &mut Frame, area: Rect, label: &str, offset: u16, style: Style) -> Option<Rect> {
    let width = label.chars().count() as u16;
    if area.width < width + offset + 2 {
        return None;
    }
    let rect = Rect::new(area.x + area.width - width - offset - 1, area.y, width, 1);
    frame.render_widget(Paragraph::new(Span::styled(label.to_string(), style)), rect);
    Some(rect)
}

fn render_page(app: &mut App, frame: &mut Frame, area: Rect) {
    if let Some(err) = &app.page_error {
        let notice = Paragraph::new(format!("Chat unavailable: {}", err))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(notice, area);
        return;
    }
    app.hit.page = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(&app.page.pointer, area.width)))
        .title(" Ask the VTS assistant ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let button_style = if app.page_mode.aria_pressed() {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let label = format!("[{}]", app.page_mode.toggle_title());
    app.hit.fullscreen_toggle = render_border_button(frame, area, &label, 1, button_style);

    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(inner);

    let focused = !app.widget_mode.is_open() || !app.widget_ready();
    let frame_no = app.animation_frame;
    app.page_layout = render_transcript(&mut app.page, frame, transcript_area, frame_no);
    app.hit.page_transcript = Some(transcript_area);
    render_input(&app.page, frame, input_area, focused);
}

fn widget_rect(area: Rect, tier: SizeTier) -> Rect {
    let ((wn, wd), (hn, hd)) = tier.fractions();
    let width = (area.width as u32 * wn as u32 / wd as u32) as u16;
    let height = (area.height as u32 * hn as u32 / hd as u32) as u16;
    Rect::new(
        area.x + area.width - width,
        area.y + area.height - height,
        width,
        height,
    )
}

fn render_widget(app: &mut App, frame: &mut Frame, area: Rect, tier: SizeTier) {
    let rect = widget_rect(area, tier);
    app.hit.widget = Some(rect);
    frame.render_widget(Clear, rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(&app.widget.pointer, rect.width)))
        .title(" Assistant ");
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let button_style = Style::default().fg(Color::Yellow).bold();
    app.hit.close_button = render_border_button(frame, rect, "[x]", 1, button_style);
    app.hit.expand_button = render_border_button(frame, rect, "[<>]", 5, button_style);

    let [transcript_area, hint_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(inner);

    let frame_no = app.animation_frame;
    app.widget_layout = render_transcript(&mut app.widget, frame, transcript_area, frame_no);
    app.hit.widget_transcript = Some(transcript_area);

    let hint = Paragraph::new(app.widget_mode.expand_title())
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
    frame.render_widget(hint, hint_area);

    render_input(&app.widget, frame, input_area, true);
}

fn render_float_button(app: &mut App, frame: &mut Frame, area: Rect) {
    let width = FLOAT_BUTTON_LABEL.chars().count() as u16 + 2;
    let height = 3;
    if area.width < width + 1 || area.height < height + 1 {
        return;
    }
    let rect = Rect::new(
        area.x + area.width - width - 1,
        area.y + area.height - height - 1,
        width,
        height,
    );
    app.hit.float_button = Some(rect);

    frame.render_widget(Clear, rect);
    let button = Paragraph::new(FLOAT_BUTTON_LABEL)
        .style(Style::default().fg(Color::Black).bg(Color::Yellow).bold())
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Yellow)));
    frame.render_widget(button, rect);
}

fn bubble_lines(bubble: &BubbleView, layout: &BubbleLayout, animation_frame: u8) -> Vec<Line<'static>> {
    let (label_color, body_style) = match (bubble.role, bubble.status) {
        (Role::User, _) => (Color::Cyan, Style::default()),
        (Role::Bot, Status::Failed) => (Color::Red, Style::default().fg(Color::Red)),
        (Role::Bot, _) => (Color::Yellow, Style::default()),
    };

    let mut label = vec![Span::styled(
        format!("{}:", bubble.label()),
        Style::default().fg(label_color).add_modifier(Modifier::BOLD),
    )];
    if bubble.copied {
        label.push(Span::styled("  copied", Style::default().fg(Color::Green)));
    }

    let mut lines = vec![Line::from(label)];
    if bubble.status == Status::Pending {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else {
        for line in &layout.body {
            let rendered = match bubble.role {
                Role::Bot => parse_markdown_line(line),
                Role::User => Line::from(line.clone()),
            };
            lines.push(rendered.patch_style(body_style));
        }
    }
    lines
}

fn render_transcript(
    session: &mut ChatSession,
    frame: &mut Frame,
    area: Rect,
    animation_frame: u8,
) -> Vec<BubbleLayout> {
    let bubbles = session.view(Instant::now());
    let layouts = layout_bubbles(&bubbles, area.width as usize);

    let text = if bubbles.is_empty() {
        Text::from(Span::styled(
            "Ask a question about the department...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for (bubble, layout) in bubbles.iter().zip(&layouts) {
            lines.extend(bubble_lines(bubble, layout, animation_frame));
            lines.push(Line::default());
        }
        Text::from(lines)
    };

    let scroll = session.clamp_scroll(total_lines(&layouts), area.height as usize);
    let transcript = Paragraph::new(text).scroll((scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(transcript, area);

    layouts
}

fn render_input(session: &ChatSession, frame: &mut Frame, area: Rect, focused: bool) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let title = if session.is_waiting() {
        " Message (waiting for reply) "
    } else {
        " Message "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = session.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = session.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if focused {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("Office is **ITE 325** today");
        assert_eq!(plain(&line), "Office is ITE 325 today");
        assert_eq!(line.spans.len(), 3);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("2 ** 3");
        assert_eq!(plain(&line), "2 ** 3");
    }

    #[test]
    fn test_widget_rect_per_tier() {
        let area = Rect::new(0, 0, 120, 40);
        assert_eq!(widget_rect(area, SizeTier::Default), Rect::new(90, 20, 30, 20));
        assert_eq!(widget_rect(area, SizeTier::Tall), Rect::new(90, 0, 30, 40));
        assert_eq!(widget_rect(area, SizeTier::Wide), Rect::new(60, 0, 60, 40));
    }

    #[test]
    fn test_border_color_tracks_pointer() {
        let mut pointer = PointerTracker::default();
        assert_eq!(border_color(&pointer, 90), Color::DarkGray);
        pointer.moved(10, 2);
        assert_eq!(border_color(&pointer, 90), Color::Cyan);
        pointer.moved(80, 2);
        assert_eq!(border_color(&pointer, 90), Color::Magenta);
    }
}
