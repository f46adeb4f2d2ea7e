use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use std::cell::{Cell, RefCell};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ConversationResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// State for the text area within the composer.
///
/// `cursor` counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    pub cursor: usize,
}

impl TextAreaState {
    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    fn insert_str(&mut self, text: &str) {
        let at = self.byte_index(self.cursor);
        self.content.insert_str(at, text);
        self.cursor += text.chars().count();
    }

    /// Delete character before cursor
    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    /// Delete character at cursor
    fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    fn set(&mut self, text: &str) {
        self.content = text.to_string();
        self.cursor = self.char_len();
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }
}

/// Conversation composer for user input
pub struct ConversationComposer {
    state: RefCell<TextAreaState>,
    placeholder: String,
    has_focus: bool,
    enabled: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: RefCell<Vec<CommandEntry>>,
    show_command_palette: Cell<bool>,
    selected_command: Cell<Option<usize>>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            placeholder: placeholder.into(),
            has_focus: true,
            enabled: true,
            command_entries: command_entries(),
            filtered_commands: RefCell::new(Vec::new()),
            show_command_palette: Cell::new(false),
            selected_command: Cell::new(None),
        }
    }

    /// Handle key input
    pub fn handle_key(&self, key: KeyEvent) -> ConversationResult {
        if key.kind != KeyEventKind::Press {
            return ConversationResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    state.insert('\n');
                } else if self.show_command_palette.get() {
                    if self.apply_selected_command(&mut state) {
                        return ConversationResult::None;
                    }
                } else if !state.content.trim().is_empty() {
                    if let Some(command) = parse_slash_command(&state.content) {
                        state.take();
                        self.close_command_palette();
                        return ConversationResult::Command(command);
                    }
                    // Busy: keep the text so it can be sent once the answer lands
                    if !self.enabled {
                        return ConversationResult::None;
                    }
                    let content = state.take();
                    self.close_command_palette();
                    return ConversationResult::Submitted(content);
                }
            }
            KeyCode::Up => {
                if self.show_command_palette.get() {
                    self.move_command_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_command_palette.get() {
                    self.move_command_selection(1);
                }
            }
            KeyCode::Esc => {
                if self.show_command_palette.get() {
                    self.close_command_palette();
                }
            }
            KeyCode::Tab => {
                if self.show_command_palette.get() {
                    self.apply_selected_command(&mut state);
                }
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ConversationResult::None;
                }
                state.insert(c);
                self.after_edit(&state, Some(c));
            }
            KeyCode::Backspace => {
                if state.backspace() {
                    self.after_edit(&state, None);
                }
            }
            KeyCode::Delete => {
                if state.delete() {
                    self.after_edit(&state, None);
                }
            }
            KeyCode::Left => {
                state.cursor = state.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                if state.cursor < state.char_len() {
                    state.cursor += 1;
                }
            }
            KeyCode::Home => {
                state.cursor = 0;
            }
            KeyCode::End => {
                state.cursor = state.char_len();
            }
            _ => {}
        }

        ConversationResult::None
    }

    /// Insert pasted text at the cursor
    pub fn paste(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        state.insert_str(text);
        self.after_edit(&state, None);
    }

    /// Keep the palette in sync with what was just typed
    fn after_edit(&self, state: &TextAreaState, typed: Option<char>) {
        if !state.content.starts_with('/') {
            self.close_command_palette();
            return;
        }

        match typed {
            Some(c) if c.is_whitespace() => self.close_command_palette(),
            _ if !self.show_command_palette.get() && state.content == "/" => {
                self.open_command_palette(state)
            }
            _ if self.show_command_palette.get() => self.refresh_command_palette(state),
            _ => {}
        }
    }

    fn open_command_palette(&self, state: &TextAreaState) {
        self.show_command_palette.set(true);
        self.refresh_command_palette(state);
        self.selected_command.set(Some(0));
    }

    fn close_command_palette(&self) {
        self.show_command_palette.set(false);
        self.filtered_commands.borrow_mut().clear();
        self.selected_command.set(None);
    }

    fn refresh_command_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered_commands.borrow_mut();
        filtered.clear();

        for entry in &self.command_entries {
            if query.is_empty() || entry.keyword.starts_with(&query) {
                filtered.push(*entry);
            }
        }

        if filtered.is_empty() {
            self.selected_command.set(None);
        } else {
            let index = self.selected_command.get().unwrap_or(0);
            let clamped = index.min(filtered.len() - 1);
            self.selected_command.set(Some(clamped));
        }
    }

    fn move_command_selection(&self, delta: isize) {
        let filtered = self.filtered_commands.borrow();
        if filtered.is_empty() {
            self.selected_command.set(None);
            return;
        }

        let current = self.selected_command.get().unwrap_or(0) as isize;
        let len = filtered.len() as isize;
        let next = (current + delta).rem_euclid(len);

        self.selected_command.set(Some(next as usize));
    }

    fn apply_selected_command(&self, state: &mut TextAreaState) -> bool {
        let filtered = self.filtered_commands.borrow();
        let Some(entry) = self.selected_command.get().and_then(|i| filtered.get(i)).copied() else {
            return false;
        };

        drop(filtered);
        state.set(&format!("/{} ", entry.keyword));
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Disable sending while a question is in flight
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Get current content
    pub fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    pub fn palette_open(&self) -> bool {
        self.show_command_palette.get()
    }

    fn title(&self) -> &'static str {
        if self.enabled {
            "💬 Ask a question (Enter to send)"
        } else {
            "⏳ Waiting for the answer..."
        }
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state.borrow();

        let border = match (self.has_focus, self.enabled) {
            (true, true) => Color::Green,
            (true, false) => Color::Yellow,
            _ => Color::Gray,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .border_style(Style::default().fg(border));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = state.content.clone();
            if self.has_focus {
                content.insert(state.byte_index(state.cursor), '▌');
            }

            // Show the tail when the text outgrows the box
            let lines: Vec<&str> = content.split('\n').collect();
            let skip = lines.len().saturating_sub(inner_area.height as usize);
            for (i, line_text) in lines.iter().skip(skip).enumerate() {
                let line = Line::from(vec![Span::raw(*line_text)]);
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        if self.show_command_palette.get() {
            let filtered = self.filtered_commands.borrow();
            let palette_height = (filtered.len().min(6) + 2) as u16;
            let palette_area = Rect {
                x: inner_area.x,
                y: area.y.saturating_sub(palette_height),
                width: inner_area.width,
                height: palette_height.min(area.y),
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            Clear.render(palette_area, buf);
            block.render(palette_area, buf);

            let selected = self.selected_command.get();
            for (index, entry) in filtered.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if selected == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}
