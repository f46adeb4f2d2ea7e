use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BACKEND_URL_ENV: &str = "TELLER_BACKEND_URL";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the assistant backend
    pub backend_url: String,

    /// Per-request timeout in seconds, 0 disables it
    pub request_timeout_secs: u64,

    /// Keep the backend session cookie between runs
    pub persist_session: bool,

    /// Where exported history files are written
    pub export_dir: Option<PathBuf>,

    /// One-key questions shown beside the chat
    pub quick_questions: Vec<String>,

    /// History panel limits
    pub history: HistoryConfig,

    /// UI preferences
    pub ui: UiConfig,

    /// Teller home directory
    #[serde(skip)]
    pub teller_home: PathBuf,
}

/// History panel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub display_limit: usize,
    pub question_chars: usize,
    pub answer_chars: usize,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub notification_secs: u64,
    pub tick_rate_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            display_limit: 10,
            question_chars: 50,
            answer_chars: 100,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "🏦 Smart Bank Assistant".to_string(),
            notification_secs: 5,
            tick_rate_ms: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            backend_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 60,
            persist_session: true,
            export_dir: None,
            quick_questions: default_quick_questions(),
            history: HistoryConfig::default(),
            ui: UiConfig::default(),
            teller_home: home.join(".teller"),
        }
    }
}

fn default_quick_questions() -> Vec<String> {
    [
        "What are your banking hours?",
        "How do I open a new account?",
        "What are the fees for wire transfers?",
        "How do I reset my online banking password?",
        "What documents do I need for a loan?",
        "How do I transfer money between accounts?",
        "What are the ATM withdrawal limits?",
        "How do I report a lost card?",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}

impl Config {
    /// Load configuration from `~/.teller/config.toml`
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Self::load_from(&home.join(".teller"))
    }

    /// Load configuration rooted at an explicit teller home
    pub fn load_from(teller_home: &Path) -> Result<Self> {
        fs::create_dir_all(teller_home).context("Failed to create .teller directory")?;

        let config_path = teller_home.join("config.toml");
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.teller_home = teller_home.to_path_buf();

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend_url = url;
            }
        }

        Ok(config)
    }

    /// Write configuration to file, refusing to clobber unless `force`
    pub fn save(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path();
        if config_path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", config_path.display());
        }

        fs::create_dir_all(&self.teller_home).context("Failed to create .teller directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(config_path)
    }

    pub fn config_path(&self) -> PathBuf {
        self.teller_home.join("config.toml")
    }

    pub fn session_path(&self) -> PathBuf {
        self.teller_home.join("session")
    }

    pub fn log_path(&self) -> PathBuf {
        self.teller_home.join("teller.log")
    }

    /// Directory exports land in: configured, else downloads, else cwd
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.ui.notification_secs)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.ui.tick_rate_ms.max(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_assistant_page() {
        let config = Config::default();
        assert_eq!(config.history, HistoryConfig { display_limit: 10, question_chars: 50, answer_chars: 100 });
        assert_eq!(config.quick_questions.len(), 8);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = Config { request_timeout_secs: 0, ..Config::default() };
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "request_timeout_secs = 5\n[history]\ndisplay_limit = 3\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.history.display_limit, 3);
        assert_eq!(config.history.answer_chars, 100);
        assert_eq!(config.teller_home, dir.path());
    }

    #[test]
    fn save_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { teller_home: dir.path().to_path_buf(), ..Config::default() };

        let path = config.save(false).unwrap();
        assert!(path.exists());
        assert!(config.save(false).is_err());
        assert!(config.save(true).is_ok());

        let reloaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.quick_questions, config.quick_questions);
    }
}
