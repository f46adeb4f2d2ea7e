//! Terminal application: owns the one ConversationClient and routes events into it

use crate::api::BackendClient;
use crate::config::Config;
use crate::events::{AppEvent, EventHandler, TuiEvent};
use crate::ui;
use crate::ui::conversation::{
    ConversationClient, ConversationComposer, ConversationResult, ParsedCommand, SlashCommand,
    SubmitOutcome,
};
use anyhow::Result;
use crossterm::{
    event::{
        DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange,
        KeyCode, KeyEvent, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Which panel receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Composer,
    History,
}

/// Everything the UI draws from, minus the terminal itself
pub struct AppState {
    pub client: ConversationClient,
    pub composer: ConversationComposer,
    pub title: String,
    pub quick_questions: Vec<String>,
    pub focus: Focus,
    pub history_selected: usize,
    pub show_help: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(client: ConversationClient, config: &Config) -> Self {
        Self {
            client,
            composer: ConversationComposer::new("Type your banking question here..."),
            title: config.ui.title.clone(),
            quick_questions: config.quick_questions.clone(),
            focus: Focus::Composer,
            history_selected: 0,
            show_help: false,
            should_quit: false,
        }
    }

    pub fn handle_tui_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Paste(text) => {
                if self.focus == Focus::Composer {
                    self.composer.paste(&text);
                }
            }
            // Coming back to the terminal may mean history changed elsewhere
            TuiEvent::FocusGained => self.client.load_history(),
            TuiEvent::Resize(..) | TuiEvent::Tick => {}
        }
        self.sync();
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        self.client.handle_event(event);
        self.sync();
    }

    /// Re-derive widget state from the client after anything changed
    fn sync(&mut self) {
        self.composer.set_enabled(!self.client.is_loading());
        self.client.notifications_mut().prune(Instant::now());

        let visible = self.client.visible_history().count();
        if visible == 0 {
            self.history_selected = 0;
            if self.focus == Focus::History {
                self.set_focus(Focus::Composer);
            }
        } else {
            self.history_selected = self.history_selected.min(visible - 1);
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.composer.set_focus(focus == Focus::Composer);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.client.pending_confirmation().is_some() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.client.resolve_confirmation(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.client.resolve_confirmation(false)
                }
                _ => {}
            }
            return;
        }

        if self.show_help {
            self.show_help = false;
            return;
        }

        if let KeyCode::F(n) = key.code {
            self.ask_quick_question(usize::from(n).saturating_sub(1));
            return;
        }

        if key.code == KeyCode::Tab && !self.composer.palette_open() {
            let next = match self.focus {
                Focus::Composer if self.client.visible_history().next().is_some() => Focus::History,
                _ => Focus::Composer,
            };
            self.set_focus(next);
            return;
        }

        match self.focus {
            Focus::History => self.handle_history_key(key),
            Focus::Composer => match self.composer.handle_key(key) {
                ConversationResult::Submitted(text) => {
                    self.client.submit(&text);
                }
                ConversationResult::Command(command) => self.handle_slash_command(command),
                ConversationResult::None => {}
            },
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        let visible = self.client.visible_history().count();
        match key.code {
            KeyCode::Up => self.history_selected = self.history_selected.saturating_sub(1),
            KeyCode::Down => {
                if self.history_selected + 1 < visible {
                    self.history_selected += 1;
                }
            }
            KeyCode::Enter => {
                if self.client.select_history_row(self.history_selected) == Some(SubmitOutcome::Sent) {
                    self.set_focus(Focus::Composer);
                }
            }
            KeyCode::Esc => self.set_focus(Focus::Composer),
            KeyCode::Char(_) => {
                // Typing goes to the composer
                self.set_focus(Focus::Composer);
                self.composer.handle_key(key);
            }
            _ => {}
        }
    }

    fn ask_quick_question(&mut self, index: usize) {
        if let Some(question) = self.quick_questions.get(index).cloned() {
            self.client.submit(&question);
        }
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) {
        match command.command {
            SlashCommand::Clear => self.client.request_clear_history(),
            SlashCommand::Export => self.client.export_history(),
            SlashCommand::History => self.client.load_history(),
            SlashCommand::Quick => {
                if let Some(index) = command.quick_index() {
                    self.ask_quick_question(index);
                }
            }
            SlashCommand::Help => self.show_help = !self.show_help,
            SlashCommand::Bye => self.should_quit = true,
        }
    }
}

/// Full-screen terminal client
pub struct TuiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: AppState,
    app_events: mpsc::UnboundedReceiver<AppEvent>,
    tick_rate: Duration,
}

impl TuiApp {
    pub fn new(config: &Config) -> Result<Self> {
        let api = BackendClient::new(config)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let client = ConversationClient::new(api, config, tx);

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste, EnableFocusChange)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            state: AppState::new(client, config),
            app_events: rx,
            tick_rate: config.tick_rate(),
        })
    }

    pub async fn run(mut self) -> Result<()> {
        let mut events = EventHandler::new(self.tick_rate);
        self.state.client.load_history();
        tracing::info!("conversation started");

        loop {
            self.terminal.draw(|frame| ui::draw(frame, &self.state))?;

            tokio::select! {
                Some(event) = events.next() => self.state.handle_tui_event(event),
                Some(event) = self.app_events.recv() => self.state.handle_app_event(event),
                else => break,
            }

            if self.state.should_quit {
                break;
            }
        }

        tracing::info!("conversation closed");
        Ok(())
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            DisableBracketedPaste,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}
