//! Transient notifications shown in the corner of the screen

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use strum::AsRefStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
}

impl NotificationKind {
    fn color(self) -> Color {
        match self {
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
            NotificationKind::Warning => Color::Yellow,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            NotificationKind::Success => "✔",
            NotificationKind::Error => "✖",
            NotificationKind::Warning => "⚠",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    raised_at: Instant,
}

/// Stack of notifications that expire after a fixed lifetime
#[derive(Debug, Clone)]
pub struct Notifications {
    items: VecDeque<Notification>,
    ttl: Duration,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.push_at(kind, message, Instant::now());
    }

    fn push_at(&mut self, kind: NotificationKind, message: impl Into<String>, raised_at: Instant) {
        self.items.push_back(Notification {
            kind,
            message: message.into(),
            raised_at,
        });
    }

    /// Drop everything older than the lifetime
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|item| now.saturating_duration_since(item.raised_at) < ttl);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Notification> {
        self.items.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub fn count(&self, kind: NotificationKind) -> usize {
        self.items.iter().filter(|n| n.kind == kind).count()
    }
}

impl Widget for &Notifications {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area.width.min(48);
        let mut y = area.y;

        for item in self.iter().rev() {
            let height = 3 + (item.message.chars().count() as u16 / width.saturating_sub(4).max(1));
            if y + height > area.bottom() {
                break;
            }

            let toast_area = Rect {
                x: area.right().saturating_sub(width),
                y,
                width,
                height,
            };
            let style = Style::default().fg(item.kind.color());
            let body = Paragraph::new(Line::from(vec![
                Span::styled(format!("{} ", item.kind.icon()), style),
                Span::raw(item.message.as_str()),
            ]))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(style)
                    .title(item.kind.as_ref()),
            );

            Clear.render(toast_area, buf);
            body.render(toast_area, buf);
            y += height;
        }
    }
}
