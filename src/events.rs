use crate::error::ApiResult;
use crate::export::ExportOutcome;
use crate::models::{Answer, HistoryEntry};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Completions of backend calls, delivered back to the UI task
#[derive(Debug)]
pub enum AppEvent {
    /// `POST /chat` settled
    ChatFinished(ApiResult<Answer>),

    /// `GET /history` settled
    HistoryLoaded(ApiResult<Vec<HistoryEntry>>),

    /// `POST /clear_history` settled
    HistoryCleared(ApiResult<()>),

    /// `GET /export_history` settled and the file, if any, was written
    HistoryExported(ApiResult<ExportOutcome>),
}

/// TUI-specific events (keyboard, focus, etc.)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal window got focus back
    FocusGained,

    /// Terminal resize
    Resize(u16, u16),

    /// Redraw tick for animations and notification expiry
    Tick,
}

/// Polls the terminal on its own thread and forwards events to the UI task
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<TuiEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            loop {
                let forwarded = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            tx.send(TuiEvent::Key(key))
                        }
                        Ok(Event::Paste(text)) => tx.send(TuiEvent::Paste(text)),
                        Ok(Event::FocusGained) => tx.send(TuiEvent::FocusGained),
                        Ok(Event::Resize(w, h)) => tx.send(TuiEvent::Resize(w, h)),
                        _ => Ok(()),
                    }
                } else {
                    tx.send(TuiEvent::Tick)
                };

                // Receiver gone means the app is shutting down
                if forwarded.is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Option<TuiEvent> {
        self.rx.recv().await
    }
}
