use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Submitted(outcome) => app.finish_submission(outcome),
        AppEvent::HistoryLoaded(turns) => app.replay_history(turns),
        AppEvent::BannerExpired(id) => app.expire_banner(id),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work whether or not input is enabled
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::PageUp => {
            let half_page = app.panel.half_page();
            app.panel.scroll_up(half_page);
        }
        KeyCode::PageDown => {
            let half_page = app.panel.half_page();
            app.panel.scroll_down(half_page);
        }
        KeyCode::Up => app.panel.scroll_up(1),
        KeyCode::Down => app.panel.scroll_down(1),
        _ if !app.panel.input_enabled() => {}
        KeyCode::Enter => app.send_message(),
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            app.insert_char(c)
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));
    let on_send = app.send_button_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if on_send => app.send_message(),
        MouseEventKind::ScrollDown if in_chat => app.panel.scroll_down(3),
        MouseEventKind::ScrollUp if in_chat => app.panel.scroll_up(3),
        _ => {}
    }
}
