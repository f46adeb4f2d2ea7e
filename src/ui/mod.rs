pub mod app;
pub mod conversation;

use crate::ui::app::{AppState, Focus};
use crate::ui::conversation::{
    get_help_text, history_rows, AnswerPanel, HistoryPanel, StatusIndicator, TranscriptView,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub use app::TuiApp;

/// Draw the whole screen
pub fn draw(frame: &mut Frame, state: &AppState) {
    let area = frame.size();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    render_header(frame, rows[0], state);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    render_chat_column(frame, columns[0], state);
    render_side_column(frame, columns[1], state);

    frame.render_widget(state.client.notifications(), rows[1]);

    if let Some(confirmation) = state.client.pending_confirmation() {
        render_confirmation(frame, area, confirmation.prompt());
    } else if state.show_help {
        render_help(frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = Line::from(Span::styled(
        format!(" {}", state.title),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(title), area);
    frame.render_widget(StatusIndicator::new(state.client.is_loading()), area);
}

fn render_chat_column(frame: &mut Frame, area: Rect, state: &AppState) {
    let composer_height = 5;

    match state.client.answer() {
        Some(answer) => {
            let panel = AnswerPanel::new(answer);
            let wanted = panel.lines(area.width.saturating_sub(2)).len() as u16 + 2;
            let answer_height = wanted.min(area.height.saturating_sub(composer_height) * 2 / 5).max(3);

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(4),
                    Constraint::Length(answer_height),
                    Constraint::Length(composer_height),
                ])
                .split(area);

            frame.render_widget(&TranscriptView::new(state.client.transcript()), chunks[0]);
            frame.render_widget(&panel, chunks[1]);
            frame.render_widget(&state.composer, chunks[2]);
        }
        None => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(4), Constraint::Length(composer_height)])
                .split(area);

            frame.render_widget(&TranscriptView::new(state.client.transcript()), chunks[0]);
            frame.render_widget(&state.composer, chunks[1]);
        }
    }
}

fn render_side_column(frame: &mut Frame, area: Rect, state: &AppState) {
    let quick_height = (state.quick_questions.len() as u16 + 2).min(area.height / 2);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(quick_height), Constraint::Min(0)])
        .split(area);

    let quick_lines: Vec<Line> = state
        .quick_questions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            Line::from(vec![
                Span::styled(format!("F{:<2} ", i + 1), Style::default().fg(Color::Cyan)),
                Span::raw(question.as_str()),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(quick_lines).block(Block::default().borders(Borders::ALL).title("⚡ Quick questions")),
        chunks[0],
    );

    let rows = history_rows(
        state.client.visible_history(),
        state.client.history_config(),
        chrono::Local::now(),
    );
    let panel = HistoryPanel::new(rows, Some(state.history_selected), state.focus == Focus::History);
    frame.render_widget(&panel, chunks[1]);
}

fn render_confirmation(frame: &mut Frame, area: Rect, prompt: &str) {
    let dialog = centered_rect(50, 20, area);
    let body = Paragraph::new(vec![
        Line::from(prompt.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y] ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw("Yes   "),
            Span::styled("[n] ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw("No"),
        ]),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Confirm")
            .border_style(Style::default().fg(Color::Yellow)),
    );

    frame.render_widget(Clear, dialog);
    frame.render_widget(body, dialog);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let dialog = centered_rect(60, 60, area);
    let body = Paragraph::new(get_help_text())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help (any key to close)")
                .border_style(Style::default().fg(Color::Cyan)),
        );

    frame.render_widget(Clear, dialog);
    frame.render_widget(body, dialog);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
