//! The conversation state machine: transcript, answer, history and the
//! single `loading` gate that keeps one question in flight at a time.

use crate::api::BackendClient;
use crate::config::{Config, HistoryConfig};
use crate::error::{ApiError, ApiResult};
use crate::events::AppEvent;
use crate::export::{self, ExportOutcome};
use crate::models::{Answer, HistoryEntry, Message};
use crate::ui::conversation::notifications::{NotificationKind, Notifications};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::mpsc;

pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";
pub const CLEAR_PROMPT: &str = "Are you sure you want to clear all conversation history?";

/// What `submit` did with its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Empty,
    Busy,
}

/// Destructive actions waiting on a yes/no from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    ClearHistory,
}

impl Confirmation {
    pub fn prompt(&self) -> &'static str {
        match self {
            Confirmation::ClearHistory => CLEAR_PROMPT,
        }
    }
}

/// Owns the chat state and talks to the backend.
///
/// Backend calls run on spawned tasks and report back through the
/// `AppEvent` channel; [`ConversationClient::handle_event`] applies them.
pub struct ConversationClient {
    api: BackendClient,
    events: mpsc::UnboundedSender<AppEvent>,
    history_config: HistoryConfig,
    export_dir: PathBuf,
    loading: bool,
    transcript: Vec<Message>,
    answer: Option<Answer>,
    history: Vec<HistoryEntry>,
    notifications: Notifications,
    pending_confirmation: Option<Confirmation>,
}

impl ConversationClient {
    pub fn new(api: BackendClient, config: &Config, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            api,
            events,
            history_config: config.history.clone(),
            export_dir: config.export_dir(),
            loading: false,
            transcript: Vec::new(),
            answer: None,
            history: Vec::new(),
            notifications: Notifications::new(config.notification_ttl()),
            pending_confirmation: None,
        }
    }

    /// Send a question. Ignored when blank or while another one is in flight.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Empty;
        }
        if self.loading {
            tracing::debug!("submit ignored, a question is already in flight");
            return SubmitOutcome::Busy;
        }

        self.transcript.push(Message::user(message));
        self.loading = true;

        let api = self.api.clone();
        let question = message.to_string();
        self.spawn_call(
            async move { api.chat(&question).await },
            AppEvent::ChatFinished,
        );

        SubmitOutcome::Sent
    }

    /// Re-ask a stored question as a new exchange
    pub fn select_history_entry(&mut self, entry: &HistoryEntry) -> SubmitOutcome {
        let question = entry.question.clone();
        self.submit(&question)
    }

    /// Re-ask the n-th visible history row
    pub fn select_history_row(&mut self, index: usize) -> Option<SubmitOutcome> {
        let entry = self.visible_history().nth(index)?.clone();
        Some(self.select_history_entry(&entry))
    }

    /// Refresh the history panel; failures are logged and otherwise ignored
    pub fn load_history(&self) {
        let api = self.api.clone();
        self.spawn_call(async move { api.history().await }, AppEvent::HistoryLoaded);
    }

    /// Ask for confirmation before clearing; nothing is sent yet
    pub fn request_clear_history(&mut self) {
        self.pending_confirmation = Some(Confirmation::ClearHistory);
    }

    /// Answer the pending confirmation, running the action only on yes
    pub fn resolve_confirmation(&mut self, confirmed: bool) {
        let Some(pending) = self.pending_confirmation.take() else {
            return;
        };
        if !confirmed {
            tracing::debug!(?pending, "confirmation declined");
            return;
        }

        match pending {
            Confirmation::ClearHistory => {
                let api = self.api.clone();
                self.spawn_call(async move { api.clear_history().await }, AppEvent::HistoryCleared);
            }
        }
    }

    /// Fetch the full history and write it to the export directory
    pub fn export_history(&self) {
        let api = self.api.clone();
        let dir = self.export_dir.clone();
        self.spawn_call(
            async move {
                let history = api.export_history().await?;
                Ok::<_, ApiError>(export::export_entries(&dir, &history).await)
            },
            AppEvent::HistoryExported,
        );
    }

    /// Apply a completed backend call
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ChatFinished(result) => {
                match result {
                    Ok(answer) => {
                        self.transcript.push(Message::assistant(answer.text.clone()));
                        self.answer = Some(answer);
                        self.load_history();
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "error sending message");
                        self.notifications
                            .push(NotificationKind::Error, format!("Error: {}", err));
                        self.transcript.push(Message::assistant(FALLBACK_REPLY));
                    }
                }
                self.loading = false;
            }
            AppEvent::HistoryLoaded(result) => match result {
                Ok(history) => self.history = history,
                Err(err) => tracing::warn!(error = %err, "error loading history"),
            },
            AppEvent::HistoryCleared(result) => match result {
                Ok(()) => {
                    self.transcript.clear();
                    self.answer = None;
                    self.load_history();
                    self.notifications.push(
                        NotificationKind::Success,
                        "Conversation history cleared successfully!",
                    );
                }
                Err(err) => {
                    tracing::error!(error = %err, "error clearing history");
                    self.notifications.push(
                        NotificationKind::Error,
                        format!("Error clearing history: {}", err),
                    );
                }
            },
            AppEvent::HistoryExported(result) => self.finish_export(result),
        }
    }

    fn finish_export(&mut self, result: ApiResult<ExportOutcome>) {
        match result {
            Ok(ExportOutcome::Empty) => self
                .notifications
                .push(NotificationKind::Warning, "No conversation history to export"),
            Ok(ExportOutcome::Written { path, entries }) => {
                tracing::info!(path = %path.display(), entries, "history exported");
                self.notifications.push(
                    NotificationKind::Success,
                    format!("Conversation history exported to {}", path.display()),
                );
            }
            Ok(ExportOutcome::WriteFailed(reason)) => {
                tracing::error!(error = %reason, "error writing export");
                self.notifications.push(
                    NotificationKind::Error,
                    format!("Error exporting history: {}", reason),
                );
            }
            Err(err) => {
                tracing::error!(error = %err, "error exporting history");
                self.notifications.push(
                    NotificationKind::Error,
                    format!("Error exporting history: {}", err),
                );
            }
        }
    }

    /// Run `call` on its own task; whatever happens to it, exactly one event comes back.
    fn spawn_call<T, F>(&self, call: F, into_event: fn(Result<T, ApiError>) -> AppEvent)
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = tokio::spawn(call)
                .await
                .unwrap_or_else(|join_err| Err(ApiError::Aborted(join_err.to_string())));
            let _ = events.send(into_event(result));
        });
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn answer(&self) -> Option<&Answer> {
        self.answer.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The entries the panel shows: the first `display_limit`, in served order
    pub fn visible_history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter().take(self.history_config.display_limit)
    }

    pub fn history_config(&self) -> &HistoryConfig {
        &self.history_config
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    pub fn pending_confirmation(&self) -> Option<Confirmation> {
        self.pending_confirmation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        client: ConversationClient,
        events: mpsc::UnboundedReceiver<AppEvent>,
        export_dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(server: &MockServer) -> Self {
            let export_dir = tempfile::tempdir().unwrap();
            let config = Config {
                backend_url: server.uri(),
                persist_session: false,
                export_dir: Some(export_dir.path().to_path_buf()),
                ..Config::default()
            };
            let (tx, rx) = mpsc::unbounded_channel();
            let api = BackendClient::new(&config).unwrap();
            Self {
                client: ConversationClient::new(api, &config, tx),
                events: rx,
                export_dir,
            }
        }

        /// Wait for the next backend completion and apply it
        async fn settle(&mut self) -> &'static str {
            let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("no backend event arrived")
                .expect("event channel closed");
            let kind = match &event {
                AppEvent::ChatFinished(_) => "chat",
                AppEvent::HistoryLoaded(_) => "history",
                AppEvent::HistoryCleared(_) => "clear",
                AppEvent::HistoryExported(_) => "export",
            };
            self.client.handle_event(event);
            kind
        }

        fn exported_files(&self) -> usize {
            std::fs::read_dir(self.export_dir.path()).unwrap().count()
        }
    }

    fn history_json(n: usize) -> serde_json::Value {
        json!((0..n)
            .map(|i| json!({
                "question": format!("Question {i}"),
                "answer": format!("Answer {i}"),
                "timestamp": "2024-05-01T09:00:00"
            }))
            .collect::<Vec<_>>())
    }

    async fn mock_history(server: &MockServer, n: usize) {
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_json(n)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        assert_eq!(harness.client.submit(""), SubmitOutcome::Empty);
        assert_eq!(harness.client.submit("   \n\t"), SubmitOutcome::Empty);
        assert!(harness.client.transcript().is_empty());
        assert!(!harness.client.is_loading());
    }

    #[tokio::test]
    async fn successful_exchange_appends_two_messages_and_reloads_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "Overdraft fees are $35.",
                "sources": []
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "question": "What are overdraft fees?",
                "answer": "Overdraft fees are $35.",
                "timestamp": "2024-05-01T09:00:00"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        assert_eq!(harness.client.submit("  What are overdraft fees?  "), SubmitOutcome::Sent);
        assert!(harness.client.is_loading());
        assert_eq!(harness.client.transcript(), &[Message::user("What are overdraft fees?")]);

        assert_eq!(harness.settle().await, "chat");
        assert!(!harness.client.is_loading());
        assert_eq!(
            harness.client.transcript(),
            &[
                Message::user("What are overdraft fees?"),
                Message::assistant("Overdraft fees are $35."),
            ]
        );
        let answer = harness.client.answer().unwrap();
        assert_eq!(answer.text, "Overdraft fees are $35.");
        assert!(!answer.has_sources());

        assert_eq!(harness.settle().await, "history");
        assert_eq!(harness.client.history().len(), 1);
    }

    #[tokio::test]
    async fn sources_are_kept_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "Branches open at 9.",
                "sources": [
                    { "question": "Opening hours?", "answer": "9am" },
                    { "question": "Weekend hours?", "answer": "Closed" }
                ]
            })))
            .mount(&server)
            .await;
        mock_history(&server, 0).await;

        let mut harness = Harness::new(&server);
        harness.client.submit("When do you open?");
        harness.settle().await;

        let sources = &harness.client.answer().unwrap().sources;
        let questions: Vec<_> = sources.iter().map(|s| s.question.as_str()).collect();
        assert_eq!(questions, ["Opening hours?", "Weekend hours?"]);
    }

    #[tokio::test]
    async fn second_submit_is_rejected_while_in_flight() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(200))
                    .set_body_json(json!({ "answer": "first" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        mock_history(&server, 0).await;

        let mut harness = Harness::new(&server);
        assert_eq!(harness.client.submit("one"), SubmitOutcome::Sent);
        assert_eq!(harness.client.submit("two"), SubmitOutcome::Busy);
        assert_eq!(harness.client.transcript().len(), 1);

        harness.settle().await;
        assert!(!harness.client.is_loading());
        assert_eq!(harness.client.transcript().len(), 2);
    }

    #[tokio::test]
    async fn failed_exchange_keeps_the_question_and_adds_the_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        harness.client.submit("Will this work?");
        harness.settle().await;

        assert!(!harness.client.is_loading());
        assert_eq!(
            harness.client.transcript(),
            &[Message::user("Will this work?"), Message::assistant(FALLBACK_REPLY)]
        );
        assert!(harness.client.answer().is_none());
        assert_eq!(harness.client.notifications().count(NotificationKind::Error), 1);
    }

    #[tokio::test]
    async fn history_failure_keeps_the_cached_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_json(3)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        harness.client.load_history();
        harness.settle().await;
        assert_eq!(harness.client.history().len(), 3);

        harness.client.load_history();
        harness.settle().await;
        assert_eq!(harness.client.history().len(), 3);
        assert!(harness.client.notifications().is_empty());
    }

    #[tokio::test]
    async fn at_most_ten_history_rows_are_visible() {
        let server = MockServer::start().await;
        mock_history(&server, 14).await;

        let mut harness = Harness::new(&server);
        harness.client.load_history();
        harness.settle().await;

        assert_eq!(harness.client.history().len(), 14);
        let visible: Vec<_> = harness
            .client
            .visible_history()
            .map(|e| e.question.as_str())
            .collect();
        assert_eq!(visible.len(), 10);
        assert_eq!(visible[0], "Question 0");
        assert_eq!(visible[9], "Question 9");
    }

    #[tokio::test]
    async fn selecting_a_history_row_asks_it_again() {
        let server = MockServer::start().await;
        mock_history(&server, 2).await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "again" })))
            .expect(1)
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        harness.client.load_history();
        harness.settle().await;

        assert_eq!(harness.client.select_history_row(1), Some(SubmitOutcome::Sent));
        assert_eq!(harness.client.transcript(), &[Message::user("Question 1")]);
        assert_eq!(harness.client.select_history_row(5), None);

        harness.settle().await;
        assert_eq!(harness.client.transcript()[1], Message::assistant("again"));
    }

    #[tokio::test]
    async fn declined_clear_does_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/clear_history"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        harness.client.transcript.push(Message::user("keep me"));

        harness.client.request_clear_history();
        assert_eq!(harness.client.pending_confirmation(), Some(Confirmation::ClearHistory));
        harness.client.resolve_confirmation(false);

        assert_eq!(harness.client.pending_confirmation(), None);
        assert_eq!(harness.client.transcript().len(), 1);
        assert!(harness.client.notifications().is_empty());
        assert!(harness.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn confirmed_clear_resets_the_conversation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/clear_history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;
        mock_history(&server, 0).await;

        let mut harness = Harness::new(&server);
        harness.client.transcript.push(Message::user("old"));
        harness.client.answer = Some(Answer { text: "old".into(), sources: vec![] });

        harness.client.request_clear_history();
        harness.client.resolve_confirmation(true);
        assert_eq!(harness.settle().await, "clear");

        assert!(harness.client.transcript().is_empty());
        assert!(harness.client.answer().is_none());
        assert_eq!(harness.client.notifications().count(NotificationKind::Success), 1);
        assert_eq!(harness.settle().await, "history");
    }

    #[tokio::test]
    async fn failed_clear_leaves_state_alone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/clear_history"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        harness.client.transcript.push(Message::user("still here"));
        harness.client.request_clear_history();
        harness.client.resolve_confirmation(true);
        harness.settle().await;

        assert_eq!(harness.client.transcript().len(), 1);
        assert_eq!(harness.client.notifications().count(NotificationKind::Error), 1);
    }

    #[tokio::test]
    async fn empty_export_warns_and_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export_history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        harness.client.export_history();
        harness.settle().await;

        assert_eq!(harness.exported_files(), 0);
        assert_eq!(harness.client.notifications().len(), 1);
        assert_eq!(harness.client.notifications().count(NotificationKind::Warning), 1);
    }

    #[tokio::test]
    async fn export_writes_one_file_with_every_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export_history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_json(12)))
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        harness.client.export_history();
        harness.settle().await;

        let files: Vec<_> = std::fs::read_dir(harness.export_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("conversation_history_") && name.ends_with(".json"));
        assert!(!name.contains(':'));

        let written: Vec<HistoryEntry> =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(written.len(), 12);
        assert_eq!(harness.client.notifications().count(NotificationKind::Success), 1);
    }

    #[tokio::test]
    async fn failed_export_raises_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export_history"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        harness.client.export_history();
        harness.settle().await;

        assert_eq!(harness.exported_files(), 0);
        assert_eq!(harness.client.notifications().count(NotificationKind::Error), 1);
    }

    #[tokio::test]
    async fn unwritable_export_directory_raises_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export_history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_json(2)))
            .mount(&server)
            .await;

        let mut harness = Harness::new(&server);
        let blocker = harness.export_dir.path().join("taken");
        std::fs::write(&blocker, "").unwrap();
        harness.client.export_dir = blocker;

        harness.client.export_history();
        assert_eq!(harness.settle().await, "export");

        assert_eq!(harness.exported_files(), 1);
        assert_eq!(harness.client.notifications().count(NotificationKind::Error), 1);
        assert_eq!(harness.client.notifications().count(NotificationKind::Success), 0);
    }
}
