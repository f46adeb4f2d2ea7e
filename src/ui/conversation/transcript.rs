//! Conversation transcript display component

use crate::models::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Transcript panel; shows the welcome text until the first message
pub struct TranscriptView<'a> {
    messages: &'a [Message],
}

impl<'a> TranscriptView<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self { messages }
    }

    fn welcome_lines() -> Vec<Line<'static>> {
        let bullet = |text: &'static str| {
            Line::from(vec![
                Span::styled("  • ", Style::default().fg(Color::Cyan)),
                Span::raw(text),
            ])
        };

        vec![
            Line::from(Span::styled(
                "🤖 Welcome to Smart Bank Assistant!",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "I'm here to help you with all your banking questions. You can ask me about:",
                Style::default().fg(Color::Gray),
            )),
            bullet("Account services and features"),
            bullet("Transaction procedures"),
            bullet("Banking policies and fees"),
            bullet("Online banking support"),
            Line::from(""),
            Line::from(Span::styled(
                "Try asking me something or use the quick questions (F1-F8)!",
                Style::default().fg(Color::DarkGray),
            )),
        ]
    }

    /// Render a single message into lines
    fn render_message(message: &Message, width: u16) -> Vec<Line<'static>> {
        let (icon, style) = match message.role {
            Role::User => ("👤", Style::default().fg(Color::Blue)),
            Role::Assistant => ("🤖", Style::default().fg(Color::Green)),
        };

        let mut lines = vec![Line::from(vec![Span::styled(
            format!("{} {}", icon, message.role.label()),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )])];

        for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, style),
            ]));
        }

        lines
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + word_len + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_line.push_str(word);
            current_len += word_len;
        }

        lines.push(current_line);
    }

    lines
}

impl Widget for &TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = if self.messages.is_empty() {
            TranscriptView::welcome_lines()
        } else {
            let mut all_lines: Vec<Line> = Vec::new();
            for message in self.messages {
                all_lines.extend(TranscriptView::render_message(message, inner_area.width));
                all_lines.push(Line::from(""));
            }
            all_lines
        };

        // Newest at the bottom: show the last screenful
        let height = inner_area.height as usize;
        let start = if self.messages.is_empty() {
            0
        } else {
            all_lines.len().saturating_sub(height)
        };

        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}
