use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Backend session cookies shared by every request of this process,
/// optionally mirrored to disk so later runs stay on the same history.
#[derive(Clone)]
pub struct SessionManager {
    jar: Arc<Jar>,
    base_url: Url,
    path: Option<PathBuf>,
    /// Cookie header last written to `path`
    saved: Arc<Mutex<Option<String>>>,
}

impl SessionManager {
    /// Fresh in-memory session
    pub fn ephemeral(base_url: Url) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            base_url,
            path: None,
            saved: Arc::new(Mutex::new(None)),
        }
    }

    /// Session mirrored at `path`, restoring whatever was saved there
    pub fn persistent(base_url: Url, path: PathBuf) -> Result<Self> {
        let session = Self {
            jar: Arc::new(Jar::default()),
            base_url,
            path: Some(path),
            saved: Arc::new(Mutex::new(None)),
        };
        session.restore()?;
        Ok(session)
    }

    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }

    /// Cookie header value the backend would currently receive
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Whether the backend has issued us a session yet
    pub fn is_established(&self) -> bool {
        self.cookie_header().is_some()
    }

    fn restore(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(path).context("Failed to read session file")?;
        for pair in content.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.jar.add_cookie_str(pair, &self.base_url);
        }
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = self.cookie_header();
        tracing::debug!(path = %path.display(), "restored backend session");
        Ok(())
    }

    /// Write the current cookies out when they changed since the last write.
    /// Returns whether the file was written; ephemeral sessions never are.
    pub async fn save(&self) -> Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        let Some(header) = self.cookie_header() else {
            return Ok(false);
        };
        if self.saved.lock().unwrap_or_else(PoisonError::into_inner).as_deref() == Some(header.as_str()) {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create session directory")?;
        }
        tokio::fs::write(path, &header)
            .await
            .context("Failed to write session file")?;

        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(header);
        tracing::debug!(path = %path.display(), "saved backend session");
        Ok(true)
    }
}
