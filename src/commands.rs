use crate::api::BackendClient;
use crate::config::Config;
use crate::export;
use crate::models::HistoryEntry;
use crate::ui::conversation::client::CLEAR_PROMPT;
use crate::ui::conversation::history_rows;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub async fn ask(config: &Config, question: &str) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        println!("❌ Please type a question.");
        return Ok(());
    }

    let api = BackendClient::new(config)?;
    let answer = api.chat(question).await.context("Error sending message")?;

    println!("🤖 {}", answer.text);
    if answer.has_sources() {
        println!();
        println!("📚 Sources:");
        for (i, source) in answer.sources.iter().enumerate() {
            println!("  {}. {}", i + 1, source.question_or_na());
            println!("     {}", source.answer_or_na());
        }
    }

    Ok(())
}

pub async fn history(config: &Config) -> Result<()> {
    let api = BackendClient::new(config)?;
    let history = api.history().await.context("Error loading history")?;
    print!("{}", render_history(&history, config));
    Ok(())
}

/// Plain-text history listing with the panel's limits
pub fn render_history(history: &[HistoryEntry], config: &Config) -> String {
    if history.is_empty() {
        return "📭 No conversation history yet. Start chatting to see your history here.\n".to_string();
    }

    let mut out = String::from("🕘 Recent conversations:\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    for row in history_rows(history, &config.history, chrono::Local::now()) {
        out.push_str(&format!("❓ {}\n", row.question));
        out.push_str(&format!("   {}\n", row.answer));
        out.push_str(&format!("   🕒 {}\n\n", row.when));
    }
    out
}

pub async fn clear(config: &Config, assume_yes: bool) -> Result<()> {
    if !assume_yes && !confirm(CLEAR_PROMPT, io::stdin().lock())? {
        println!("👋 Nothing cleared.");
        return Ok(());
    }

    let api = BackendClient::new(config)?;
    api.clear_history().await.context("Error clearing history")?;
    println!("✅ Conversation history cleared successfully!");
    Ok(())
}

/// Ask a yes/no question on stdout, reading the reply from `input`
fn confirm(prompt: &str, mut input: impl BufRead) -> Result<bool> {
    print!("⚠️  {} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut reply = String::new();
    input.read_line(&mut reply).context("Failed to read confirmation")?;
    Ok(matches!(reply.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub async fn export(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let api = BackendClient::new(config)?;
    let history = api.export_history().await.context("Error exporting history")?;

    if history.is_empty() {
        println!("⚠️  No conversation history to export");
        return Ok(());
    }

    let dir = output.unwrap_or_else(|| config.export_dir());
    let path = export::write_export(&dir, &history, chrono::Utc::now()).await?;
    println!("✅ Conversation history exported successfully!");
    println!("📍 {}", path.display());
    Ok(())
}

pub fn init_config(config: &Config, force: bool) -> Result<()> {
    let path = config.save(force)?;
    println!("📝 Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn confirm_accepts_only_yes() {
        assert!(confirm("Sure?", "y\n".as_bytes()).unwrap());
        assert!(confirm("Sure?", "YES\n".as_bytes()).unwrap());
        assert!(!confirm("Sure?", "\n".as_bytes()).unwrap());
        assert!(!confirm("Sure?", "nope\n".as_bytes()).unwrap());
    }

    #[test]
    fn history_listing_uses_panel_limits() {
        let config = Config::default();
        let history: Vec<_> = (0..12)
            .map(|i| HistoryEntry::new(format!("Question {i}"), "a".repeat(120), "2024-05-01T09:00:00"))
            .collect();

        let listing = render_history(&history, &config);
        assert_eq!(listing.matches("❓").count(), 10);
        assert!(listing.contains(&format!("{}...", "a".repeat(100))));
        assert!(!listing.contains("Question 10"));
    }

    #[test]
    fn empty_history_listing() {
        assert!(render_history(&[], &Config::default()).contains("No conversation history yet"));
    }

    #[tokio::test]
    async fn export_command_writes_into_the_output_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export_history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "question": "q", "answer": "a", "timestamp": "2024-05-01T09:00:00" }
            ])))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            backend_url: server.uri(),
            persist_session: false,
            ..Config::default()
        };
        export(&config, Some(dir.path().to_path_buf())).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn ask_reports_backend_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = Config {
            backend_url: server.uri(),
            persist_session: false,
            ..Config::default()
        };
        assert!(ask(&config, "hello").await.is_err());
    }
}
