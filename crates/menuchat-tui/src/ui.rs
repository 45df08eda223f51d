use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs},
};

use menuchat_core::{ChatModel, Persona, PromptMode};

use crate::app::{App, Focus, InputField};

/// Hard-wrap `text` at `width` chars per row and find the cursor's row and column.
///
/// A cursor just past a full final row gets an empty row of its own; past a
/// full row in the middle of the text it stays on that row's last column.
fn wrap_with_cursor(text: &str, cursor: usize, width: usize) -> (Vec<String>, (u16, u16)) {
    let width = width.max(1);
    let line_count = text.split('\n').count();
    let mut rows: Vec<String> = Vec::new();
    let mut cursor_pos = (0u16, 0u16);
    let mut consumed = 0usize;

    for (index, line) in text.split('\n').enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let start_row = rows.len();
        if chars.is_empty() {
            rows.push(String::new());
        } else {
            for chunk in chars.chunks(width) {
                rows.push(chunk.iter().collect());
            }
        }

        let len = chars.len();
        if cursor >= consumed && cursor <= consumed + len {
            let offset = cursor - consumed;
            let row = start_row + offset / width;
            cursor_pos = if row < rows.len() {
                (row as u16, (offset % width) as u16)
            } else if index + 1 == line_count {
                rows.push(String::new());
                (row as u16, 0)
            } else {
                ((row - 1) as u16, (width - 1) as u16)
            };
        }
        consumed += len + 1;
    }

    (rows, cursor_pos)
}

/// Word-wrap `text` to `width` columns, keeping explicit line breaks and
/// splitting words longer than a row.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            // Word doesn't fit, start new line
            if current_len > 0 && current_len + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }

            // Word wider than a whole row gets split
            while word.len() > width {
                let rest = word.split_off(width);
                lines.push(word.iter().collect());
                word = rest;
            }

            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_line.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current_line);
    }

    lines
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let input_height = if app.mode == PromptMode::Reply { 14 } else { 8 };

    let [header_area, key_area, model_area, tabs_area, input_area, status_area, error_area, response_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(input_height),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(app, frame, header_area);
    render_api_key(app, frame, key_area);
    render_model_line(app, frame, model_area);
    render_mode_tabs(app, frame, tabs_area);
    render_inputs(app, frame, input_area);
    render_status(app, frame, status_area);
    render_error(app, frame, error_area);
    render_response(app, frame, response_area);
    render_footer(app, frame, footer_area);

    if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let persona = match app.persona {
        Persona::Plain => String::new(),
        other => format!(" [{}]", other.as_str()),
    };

    let title = Line::from(vec![
        Span::styled(" MenuChat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(persona, Style::default().fg(Color::Magenta)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_api_key(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::ApiKey && !app.show_model_picker;
    let title = if app.api_key_from_env() {
        " OpenAI API Key (from OPENAI_API_KEY) "
    } else {
        " OpenAI API Key "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(focused));
    let inner = block.inner(area);
    let width = inner.width as usize;

    let field = &app.api_key;
    let line = if field.text.is_empty() && !focused {
        Line::from(Span::styled("sk-...", Style::default().fg(Color::DarkGray)))
    } else {
        let offset = field.cursor.saturating_sub(width.saturating_sub(1));
        let masked: String = std::iter::repeat('•')
            .take(field.text.chars().count())
            .skip(offset)
            .take(width)
            .collect();
        Line::from(masked)
    };
    frame.render_widget(Paragraph::new(line).block(block), area);

    if focused && inner.width > 0 {
        let offset = field.cursor.saturating_sub(width.saturating_sub(1));
        frame.set_cursor_position((inner.x + (field.cursor - offset) as u16, inner.y));
    }
}

fn render_model_line(app: &App, frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" Model: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.model.display_name(), Style::default().fg(Color::Green).bold()),
        Span::styled("  (Ctrl-O to change)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_mode_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let modes = PromptMode::all();
    let selected = modes.iter().position(|m| *m == app.mode).unwrap_or(0);
    let titles: Vec<&str> = modes.iter().map(|m| m.as_str()).collect();

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, area);
}

fn render_inputs(app: &App, frame: &mut Frame, area: Rect) {
    let picker_open = app.show_model_picker;
    let primary_focused = app.focus == Focus::Primary && !picker_open;

    if app.mode == PromptMode::Reply {
        let [top, bottom] =
            Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);
        render_text_field(frame, top, app.primary_label(), &app.reply_to, primary_focused);
        render_text_field(
            frame,
            bottom,
            "Your main idea for the reply",
            &app.reply_idea,
            app.focus == Focus::Secondary && !picker_open,
        );
    } else {
        render_text_field(frame, area, app.primary_label(), app.primary_field(), primary_focused);
    }
}

fn render_text_field(frame: &mut Frame, area: Rect, label: &str, field: &InputField, focused: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", label))
        .border_style(border_style(focused));
    let inner = block.inner(area);

    let (rows, (row, col)) = wrap_with_cursor(&field.text, field.cursor, inner.width as usize);
    let scroll = if focused {
        row.saturating_sub(inner.height.saturating_sub(1))
    } else {
        0
    };

    let lines: Vec<Line> = rows.into_iter().map(Line::from).collect();
    frame.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);

    if focused && inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position((inner.x + col, inner.y + row - scroll));
    }
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let line = if app.is_loading() {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        Line::from(Span::styled(
            format!(" Sending{}", dots),
            Style::default().fg(Color::Yellow),
        ))
    } else if app.can_send() {
        Line::from(vec![
            Span::styled(" [Enter] ", Style::default().fg(Color::Black).bg(Color::Green)),
            Span::styled(" Send to ChatGPT", Style::default().fg(Color::Green).bold()),
        ])
    } else {
        Line::from(Span::styled(
            " Fill in the fields above to send",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_error(app: &App, frame: &mut Frame, area: Rect) {
    if let Some(error) = &app.error_message {
        let line = Line::from(Span::styled(format!(" {}", error), Style::default().fg(Color::Red)));
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn render_response(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Response && !app.show_model_picker;
    let copy_hint = if app.copy_feedback.is_active(Instant::now()) {
        Line::from(Span::styled(" Copied ✓ ", Style::default().fg(Color::Green).bold()))
    } else if app.response.is_empty() {
        Line::default()
    } else {
        Line::from(Span::styled(" Ctrl-Y copy ", Style::default().fg(Color::DarkGray)))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Response ")
        .title(copy_hint.right_aligned())
        .border_style(border_style(focused));
    let inner = block.inner(area);
    app.response_area = Some(inner);

    let lines = wrap_text_to_width(&app.response, inner.width as usize);
    let max_scroll = (lines.len() as u16).saturating_sub(inner.height);
    app.response_scroll = app.response_scroll.min(max_scroll);

    let lines: Vec<Line> = lines.into_iter().map(Line::from).collect();
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.response_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = if app.show_model_picker {
        " j/k move · Enter select · Esc close"
    } else if app.focus == Focus::Response {
        " j/k scroll · c copy · Tab next field · Esc quit"
    } else {
        " Tab next field · Ctrl-T mode · Alt-Enter newline · Ctrl-Y copy · Esc quit"
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))),
        area,
    );
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let models = ChatModel::all();
    let width = 36.min(area.width);
    let height = (models.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let items: Vec<ListItem> = models
        .iter()
        .map(|model| {
            let marker = if *model == app.model { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::raw(model.display_name()),
                Span::styled(format!("  {}", model.as_str()), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Select Model ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    frame.render_widget(Clear, popup);
    frame.render_stateful_widget(list, popup, &mut app.model_picker_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{app_with, CannedTransport};
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_wrap_short_text() {
        let (rows, cursor) = wrap_with_cursor("hello", 5, 10);
        assert_eq!(rows, vec!["hello"]);
        assert_eq!(cursor, (0, 5));
    }

    #[test]
    fn test_wrap_long_line_and_newlines() {
        let (rows, cursor) = wrap_with_cursor("abcdefg\nxy", 9, 3);
        assert_eq!(rows, vec!["abc", "def", "g", "xy"]);
        assert_eq!(cursor, (3, 1));
    }

    #[test]
    fn test_cursor_after_full_last_row_gets_its_own_row() {
        let (rows, cursor) = wrap_with_cursor("z\nabc", 5, 3);
        assert_eq!(rows, vec!["z", "abc", ""]);
        assert_eq!(cursor, (2, 0));
    }

    #[test]
    fn test_cursor_after_full_middle_row_adds_no_row() {
        let (rows, cursor) = wrap_with_cursor("abc\nz", 3, 3);
        assert_eq!(rows, vec!["abc", "z"]);
        assert_eq!(cursor, (0, 2));
    }

    #[test]
    fn test_wrap_empty_text() {
        let (rows, cursor) = wrap_with_cursor("", 0, 10);
        assert_eq!(rows, vec![""]);
        assert_eq!(cursor, (0, 0));
    }

    #[test]
    fn test_word_wrap_breaks_at_spaces() {
        let lines = wrap_text_to_width("the quick brown fox", 10);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_word_wrap_keeps_blank_lines_and_splits_long_words() {
        let lines = wrap_text_to_width("ab\n\nabcdefghij xy", 4);
        assert_eq!(lines, vec!["ab", "", "abcd", "efgh", "ij", "xy"]);
        assert_eq!(wrap_text_to_width("", 4), vec![""]);
    }

    #[test]
    fn test_response_tail_visible_at_max_scroll() {
        let transport = CannedTransport::new(200, "{}");
        let mut app = app_with(transport, "sk-test", Persona::Plain);
        let words: Vec<String> = (0..60).map(|i| format!("word{:03}", i)).collect();
        app.response = format!("{} ENDMARK", words.join(" "));
        app.response_scroll = u16::MAX;

        let mut terminal = Terminal::new(TestBackend::new(22, 40)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(screen.contains("ENDMARK"), "response tail not visible:\n{}", screen);
        assert!(app.response_scroll > 0);
    }
}
