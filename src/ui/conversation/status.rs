use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::time::{SystemTime, UNIX_EPOCH};

const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Busy indicator shown in the header
pub struct StatusIndicator {
    loading: bool,
}

impl StatusIndicator {
    pub fn new(loading: bool) -> Self {
        Self { loading }
    }

    pub fn line(&self) -> Line<'static> {
        if self.loading {
            let frame = (SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis()
                / 100) as usize
                % SPINNER.len();
            Line::from(vec![
                Span::styled(format!("{} ", SPINNER[frame]), Style::default().fg(Color::Yellow)),
                Span::styled("Thinking...", Style::default().fg(Color::Yellow)),
            ])
        } else {
            Line::from(vec![
                Span::styled("● ", Style::default().fg(Color::Green)),
                Span::styled("Ready", Style::default().fg(Color::Green)),
            ])
        }
    }
}

impl Widget for StatusIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = self.line();
        let width = line.width() as u16;
        let x = area.right().saturating_sub(width + 1).max(area.x);
        buf.set_line(x, area.y, &line, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn shows_ready_or_thinking() {
        assert!(text(&StatusIndicator::new(false).line()).ends_with("Ready"));
        assert!(text(&StatusIndicator::new(true).line()).ends_with("Thinking..."));
    }
}
