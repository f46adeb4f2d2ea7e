//! History panel: the last few stored exchanges, truncated for display

use crate::config::HistoryConfig;
use crate::format::{format_timestamp, truncate_text};
use crate::models::HistoryEntry;
use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// One history entry as the panel shows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub question: String,
    pub answer: String,
    pub when: String,
}

/// Truncate and date the visible entries
pub fn history_rows<'a>(
    entries: impl IntoIterator<Item = &'a HistoryEntry>,
    config: &HistoryConfig,
    now: DateTime<Local>,
) -> Vec<HistoryRow> {
    entries
        .into_iter()
        .take(config.display_limit)
        .map(|entry| HistoryRow {
            question: truncate_text(&entry.question, config.question_chars),
            answer: truncate_text(&entry.answer, config.answer_chars),
            when: format_timestamp(&entry.timestamp, now),
        })
        .collect()
}

/// History side panel
pub struct HistoryPanel {
    rows: Vec<HistoryRow>,
    selected: Option<usize>,
    has_focus: bool,
}

impl HistoryPanel {
    pub fn new(rows: Vec<HistoryRow>, selected: Option<usize>, has_focus: bool) -> Self {
        Self {
            rows,
            selected,
            has_focus,
        }
    }

    fn row_lines(&self, index: usize, row: &HistoryRow, width: u16) -> Vec<Line<'static>> {
        let is_selected = self.has_focus && self.selected == Some(index);
        let marker = if is_selected { "▶ " } else { "  " };
        let question_style = if is_selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(row.question.clone(), question_style),
        ])];
        for chunk in wrap_chars(&row.answer, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(chunk, Style::default().fg(Color::Gray)),
            ]));
        }
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(row.when.clone(), Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::from(""));
        lines
    }
}

/// Hard-wrap on character count; answers are already short
fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

impl Widget for &HistoryPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.has_focus { Color::Cyan } else { Color::Gray };
        let block = Block::default()
            .borders(Borders::ALL)
            .title("🕘 Recent conversations")
            .border_style(Style::default().fg(border));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.rows.is_empty() {
            let placeholder = [
                Line::from(Span::styled("No conversation history yet", Style::default().fg(Color::Gray))),
                Line::from(Span::styled(
                    "Start chatting to see your history here",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            for (i, line) in placeholder.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let mut all_lines = Vec::new();
        let mut selected_start = 0;
        for (index, row) in self.rows.iter().enumerate() {
            if self.selected == Some(index) {
                selected_start = all_lines.len();
            }
            all_lines.extend(self.row_lines(index, row, inner_area.width));
        }

        // Keep the selected row on screen
        let height = inner_area.height as usize;
        let start = if selected_start + 4 > height {
            (selected_start + 4 - height).min(all_lines.len().saturating_sub(height))
        } else {
            0
        };

        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}
