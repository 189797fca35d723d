use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use javabot::format::{parse_tag, MarkupTag};
use javabot::{Message, MessageKind, Sender};
use crate::app::{App, Health};

const MAX_INPUT_ROWS: usize = 6;

/// Turn a markup fragment into styled lines. `<br>` and newlines break the
/// line, `<b>` and `<i>` toggle modifiers, anything else is shown as-is.
fn markup_lines(content: &str, base: Style) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut bold = false;
    let mut italic = false;

    let style_for = |bold: bool, italic: bool| {
        let mut style = base;
        if bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    };

    let mut rest = content;
    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some((tag, len)) = parse_tag(rest) {
                if !current.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut current), style_for(bold, italic)));
                }
                match tag {
                    MarkupTag::Break => lines.push(Line::from(std::mem::take(&mut spans))),
                    MarkupTag::Bold(open) => bold = open,
                    MarkupTag::Italic(open) => italic = open,
                }
                rest = &rest[len..];
                continue;
            }
        }

        match c {
            '\n' => {
                if !current.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut current), style_for(bold, italic)));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
            }
            '\r' => {}
            '\t' => current.push_str("    "),
            _ => current.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }

    if !current.is_empty() {
        spans.push(Span::styled(current, style_for(bold, italic)));
    }
    lines.push(Line::from(spans));
    lines
}

fn plain_lines(content: &str, base: Style) -> Vec<Line<'static>> {
    let lines: Vec<Line<'static>> = content
        .lines()
        .map(|line| Line::from(Span::styled(line.replace('\t', "    "), base)))
        .collect();
    if lines.is_empty() {
        vec![Line::default()]
    } else {
        lines
    }
}

fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let (label, label_color) = match message.sender {
        Sender::User => ("You:", Color::Cyan),
        Sender::Bot => ("Bot:", Color::Yellow),
    };
    lines.push(Line::from(Span::styled(
        label,
        Style::default().fg(label_color).add_modifier(Modifier::BOLD),
    )));

    let body_style = match message.kind {
        MessageKind::Plain => Style::default(),
        MessageKind::Success => Style::default().fg(Color::Green),
        MessageKind::Error => Style::default().fg(Color::Red),
    };

    if message.is_markup() {
        lines.extend(markup_lines(&message.content, body_style));
    } else {
        lines.extend(plain_lines(&message.content, body_style));
    }
    lines.push(Line::default());
    lines
}

/// Rows `text` occupies once word-wrapped to `width` columns, counted by the
/// same wrapper the transcript paragraph renders with.
fn wrapped_height(text: &Text, width: u16) -> u16 {
    let rows = Paragraph::new(text.clone())
        .wrap(Wrap { trim: false })
        .line_count(width.max(1));
    rows.min(u16::MAX as usize) as u16
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_rows = app.input.split('\n').count().clamp(1, MAX_INPUT_ROWS) as u16;

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (status, status_color) = match &app.health {
        Health::Checking => ("● checking".to_string(), Color::Yellow),
        Health::Online => ("● online".to_string(), Color::Green),
        Health::Offline => ("● offline".to_string(), Color::Red),
    };

    let title = Line::from(vec![
        Span::styled(" Java Chatbot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(status, Style::default().fg(status_color)),
        Span::raw(" "),
        Span::styled(app.client.endpoint().to_string(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let pending = app.widget.is_pending();
    let text = if app.widget.transcript().is_empty() && !pending {
        Text::from(Span::styled(
            "Ask a Java question or paste some code...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = app
            .widget
            .transcript()
            .iter()
            .flat_map(message_lines)
            .collect();

        if pending {
            lines.push(Line::from(Span::styled(
                "Bot:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_lines = wrapped_height(&text, area.width.saturating_sub(2));
    if app.follow_bottom {
        app.scroll = app.max_scroll();
    }

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.widget.controls_enabled();

    let (border_color, title) = if enabled {
        (Color::Yellow, " Ask (Enter to send, Alt-Enter for newline) ")
    } else {
        (Color::DarkGray, " Waiting for reply... ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    // Cursor row/column within the (possibly multi-line) input
    let before_cursor: String = app.input.chars().take(app.cursor).collect();
    let cursor_row = before_cursor.matches('\n').count();
    let cursor_col = before_cursor
        .rsplit('\n')
        .next()
        .map(|line| line.chars().count())
        .unwrap_or(0);

    // Scroll offsets to keep cursor visible
    let row_offset = (cursor_row + 1).saturating_sub(inner_height);
    let col_offset = if inner_width == 0 {
        0
    } else {
        (cursor_col + 1).saturating_sub(inner_width)
    };

    let visible: Vec<Line> = app
        .input
        .split('\n')
        .skip(row_offset)
        .take(inner_height)
        .map(|line| {
            Line::from(
                line.chars()
                    .skip(col_offset)
                    .take(inner_width)
                    .collect::<String>(),
            )
        })
        .collect();

    let text_style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let input = Paragraph::new(visible).style(text_style).block(block);
    frame.render_widget(input, area);

    // Show cursor while the input has focus
    if app.widget.input_focused() && enabled {
        frame.set_cursor_position((
            area.x + (cursor_col - col_offset) as u16 + 1,
            area.y + (cursor_row - row_offset) as u16 + 1,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = if app.widget.is_pending() {
        (" PENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut hints = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
    ];
    if app.widget.controls_enabled() {
        hints.extend(vec![
            Span::styled(" Ctrl-L ", key_style),
            Span::styled(" clear ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use javabot::{ApiClient, ApiResponse};
    use ratatui::{backend::TestBackend, Terminal};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_break_splits_lines() {
        let lines = markup_lines("Hello<br>World<BR/>!", Style::default());
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["Hello", "World", "!"]);
    }

    #[test]
    fn test_bold_and_italic_spans() {
        let lines = markup_lines("1. <b>Fix import</b> <i>now</i>", Style::default());
        assert_eq!(lines.len(), 1);

        let spans = &lines[0].spans;
        assert_eq!(spans[0].content, "1. ");
        assert_eq!(spans[1].content, "Fix import");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(!spans[2].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[3].content, "now");
        assert!(spans[3].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_unknown_markup_is_literal() {
        let lines = markup_lines("List<String> x < y", Style::default());
        assert_eq!(line_text(&lines[0]), "List<String> x < y");
    }

    #[test]
    fn test_plain_messages_are_not_interpreted() {
        let lines = message_lines(&Message::bot("use <b> for bold"));
        assert_eq!(line_text(&lines[1]), "use <b> for bold");
    }

    #[test]
    fn test_wrapped_height_counts_word_wrapping() {
        // Two six-letter words never share a ten-column row
        let text = Text::from(vec![Line::from("abcdef abcdef abcdef"), Line::default()]);
        assert_eq!(wrapped_height(&text, 10), 4);
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_long_reply_tail_is_reachable() {
        let mut app = App::new(ApiClient::new("http://127.0.0.1:9/api/query").unwrap());
        app.widget.begin_submit("tell me everything").unwrap();
        let answer = format!("{}ENDMARK", "aaaa bbbb cccc ".repeat(40));
        app.widget.complete_submit::<String>(Ok(ApiResponse::Qa {
            answer,
            confidence: None,
        }));

        let mut terminal = Terminal::new(TestBackend::new(20, 14)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen_text(&terminal).contains("ENDMARK"));

        app.scroll_up(1000);
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(!screen_text(&terminal).contains("ENDMARK"));

        app.scroll_down(1000);
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen_text(&terminal).contains("ENDMARK"));
    }

    #[test]
    fn test_render_shows_typing_indicator_while_pending() {
        let mut app = App::new(ApiClient::new("http://127.0.0.1:9/api/query").unwrap());
        app.widget.begin_submit("What is a JVM?").unwrap();

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("What is a JVM?"));
        assert!(screen.contains("Thinking."));
        assert!(screen.contains("Waiting for reply"));
    }
}
