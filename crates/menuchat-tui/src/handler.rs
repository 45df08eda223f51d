use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, Focus};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any state
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.show_model_picker {
        handle_model_picker(app, key);
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Char('t') if ctrl => app.cycle_mode(),
        KeyCode::Char('o') if ctrl => app.open_model_picker(),
        KeyCode::Char('y') if ctrl => app.copy_response(Instant::now()),
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            if app.focus != Focus::ApiKey {
                if let Some(field) = app.focused_field_mut() {
                    field.insert('\n');
                }
            }
        }
        KeyCode::Enter => app.send(),
        _ if app.focus == Focus::Response => handle_response_key(app, key),
        _ => handle_field_key(app, key),
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.show_model_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => app.select_model(),
        _ => {}
    }
}

fn handle_response_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_response_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_response_up(),
        KeyCode::Char('g') | KeyCode::Home => app.response_scroll = 0,
        KeyCode::Char('c') => app.copy_response(Instant::now()),
        _ => {}
    }
}

fn handle_field_key(app: &mut App, key: KeyEvent) {
    let on_api_key = app.focus == Focus::ApiKey;
    let Some(field) = app.focused_field_mut() else {
        return;
    };

    let changed = match key.code {
        KeyCode::Backspace => field.backspace(),
        KeyCode::Delete => field.delete(),
        KeyCode::Left => {
            field.left();
            false
        }
        KeyCode::Right => {
            field.right();
            false
        }
        KeyCode::Home => {
            field.home();
            false
        }
        KeyCode::End => {
            field.end();
            false
        }
        // API keys never contain whitespace
        KeyCode::Char(c) if on_api_key && c.is_whitespace() => false,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            field.insert(c);
            true
        }
        _ => false,
    };

    if changed && on_api_key {
        app.api_key_edited();
    }
}

fn handle_paste(app: &mut App, text: &str) {
    if app.show_model_picker {
        return;
    }
    let on_api_key = app.focus == Focus::ApiKey;
    let Some(field) = app.focused_field_mut() else {
        return;
    };

    if on_api_key {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        field.insert_str(&cleaned);
        app.api_key_edited();
    } else {
        // Terminals send CR line endings inside bracketed paste
        field.insert_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_response = app
        .response_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_response {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            for _ in 0..3 {
                app.scroll_response_down();
            }
        }
        MouseEventKind::ScrollUp => {
            for _ in 0..3 {
                app.scroll_response_up();
            }
        }
        _ => {}
    }
}
