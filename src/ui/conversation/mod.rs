//! Conversation UI components for chat interface

pub mod answer;
pub mod client;
pub mod commands;
pub mod composer;
pub mod history;
pub mod notifications;
pub mod status;
pub mod transcript;

pub use answer::AnswerPanel;
pub use client::{Confirmation, ConversationClient, SubmitOutcome};
pub use commands::{get_help_text, ParsedCommand, SlashCommand};
pub use composer::{ConversationComposer, ConversationResult};
pub use history::{history_rows, HistoryPanel, HistoryRow};
pub use notifications::{NotificationKind, Notifications};
pub use status::StatusIndicator;
pub use transcript::TranscriptView;
