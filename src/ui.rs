use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use crate::app::App;
use crate::chat::{EntryKind, Sender};

const SEND_BUTTON_WIDTH: u16 = 10;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_row, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_row);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Conversary ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.backend_label.as_str(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn ai_label() -> Line<'static> {
    Line::from(Span::styled(
        "Chi:",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    // Inner size minus borders, used for scroll calculations
    let inner_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);
    if (app.panel.viewport_height, app.panel.viewport_width) != (inner_height, inner_width) {
        app.panel.viewport_height = inner_height;
        app.panel.viewport_width = inner_width;
        app.panel.scroll_to_bottom();
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let text = if app.panel.is_empty() {
        Text::from(Span::styled(
            "Say something to Chi...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        // Rows are wrapped here, not by the Paragraph, so the panel's
        // scroll maths counts exactly what gets drawn
        let width = app.panel.wrap_width();
        let mut lines: Vec<Line> = Vec::new();

        for entry in app.panel.entries() {
            let rows = entry.wrapped_lines(width);
            match &entry.kind {
                EntryKind::Message { sender: Sender::User, .. } => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(rows.into_iter().map(Line::from));
                    lines.push(Line::default());
                }
                EntryKind::Message { sender: Sender::Ai, .. } => {
                    lines.push(ai_label());
                    lines.extend(rows.into_iter().map(Line::from));
                    lines.push(Line::default());
                }
                EntryKind::Loading => {
                    lines.push(ai_label());
                    // Animated ellipsis on the last row: ".", "..", "..."
                    let last = rows.len().saturating_sub(1);
                    let dots = ".".repeat((app.animation_frame as usize) + 1);
                    let style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
                    for (i, row) in rows.into_iter().enumerate() {
                        let row = if i == last {
                            format!("{}{dots}", row.trim_end_matches('.'))
                        } else {
                            row
                        };
                        lines.push(Line::from(Span::styled(row, style)));
                    }
                    lines.push(Line::default());
                }
                EntryKind::Error(_) => {
                    let style = Style::default().fg(Color::White).bg(Color::Red);
                    lines.extend(rows.into_iter().map(|row| Line::from(Span::styled(row, style))));
                    lines.push(Line::default());
                }
            }
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .scroll((app.panel.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(SEND_BUTTON_WIDTH),
    ])
    .areas(area);
    app.send_button_area = Some(button_area);

    let enabled = app.panel.input_enabled();
    let border_color = if enabled { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;

    // Horizontal scroll keeps the cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(visible_text).style(text_style).block(input_block);
    frame.render_widget(input, input_area);

    let button_style = if enabled {
        Style::default().fg(Color::Black).bg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::Gray).bg(Color::DarkGray)
    };
    let button = Paragraph::new("Send")
        .alignment(Alignment::Center)
        .style(button_style)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(border_color)));
    frame.render_widget(button, button_area);

    if enabled {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = if app.is_sending() {
        vec![Span::styled(" waiting for reply ", label_style.add_modifier(Modifier::ITALIC))]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
        ]
    };
    hints.extend(vec![
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
