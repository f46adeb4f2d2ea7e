//! Latest answer with its supporting sources

use crate::models::Answer;
use crate::ui::conversation::transcript::wrap_text;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub struct AnswerPanel<'a> {
    answer: &'a Answer,
}

impl<'a> AnswerPanel<'a> {
    pub fn new(answer: &'a Answer) -> Self {
        Self { answer }
    }

    /// Lines of the panel body; the sources section only exists when there are sources
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let width = width as usize;
        let mut lines: Vec<Line<'static>> = wrap_text(&self.answer.text, width)
            .into_iter()
            .map(Line::from)
            .collect();

        if self.answer.has_sources() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "📚 Sources",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));

            for (i, source) in self.answer.sources.iter().enumerate() {
                let prefix = format!("{}. ", i + 1);
                let indent = " ".repeat(prefix.len());
                let question = wrap_text(source.question_or_na(), width.saturating_sub(prefix.len()));
                for (j, chunk) in question.into_iter().enumerate() {
                    let lead = if j == 0 { prefix.clone() } else { indent.clone() };
                    lines.push(Line::from(vec![
                        Span::styled(lead, Style::default().fg(Color::DarkGray)),
                        Span::styled(chunk, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                    ]));
                }
                for chunk in wrap_text(source.answer_or_na(), width.saturating_sub(indent.len())) {
                    lines.push(Line::from(vec![
                        Span::raw(indent.clone()),
                        Span::styled(chunk, Style::default().fg(Color::Gray)),
                    ]));
                }
            }
        }

        lines
    }
}

impl Widget for &AnswerPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("✅ Answer")
            .border_style(Style::default().fg(Color::Green));

        let inner_area = block.inner(area);
        block.render(area, buf);

        for (i, line) in self
            .lines(inner_area.width)
            .iter()
            .take(inner_area.height as usize)
            .enumerate()
        {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.to_string()).collect())
            .collect()
    }

    #[test]
    fn no_sources_means_no_sources_section() {
        let answer = Answer { text: "Overdraft fees are $35.".into(), sources: vec![] };
        let lines = text_of(&AnswerPanel::new(&answer).lines(40));
        assert_eq!(lines, vec!["Overdraft fees are $35."]);
    }

    #[test]
    fn sources_render_in_order_with_na_for_blanks() {
        let answer = Answer {
            text: "Yes.".into(),
            sources: vec![
                Source { question: "First?".into(), answer: "One".into() },
                Source { question: "".into(), answer: "Two".into() },
            ],
        };
        let lines = text_of(&AnswerPanel::new(&answer).lines(40));
        assert_eq!(
            lines,
            vec!["Yes.", "", "📚 Sources", "1. First?", "   One", "2. N/A", "   Two"]
        );
    }
}
