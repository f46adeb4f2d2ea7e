use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{Answer, ChatRequest, ChatResponse, HistoryEntry};
use crate::session::SessionManager;
use anyhow::Context;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;

/// HTTP client for the assistant backend
#[derive(Clone)]
pub struct BackendClient {
    base_url: Url,
    client: reqwest::Client,
    session: SessionManager,
    /// Set once `GET /` has been answered
    handshake: Arc<Mutex<bool>>,
}

impl BackendClient {
    /// Build a client from configuration, restoring the saved session if enabled
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base_url = parse_base_url(&config.backend_url)?;
        let session = if config.persist_session {
            SessionManager::persistent(base_url.clone(), config.session_path())?
        } else {
            SessionManager::ephemeral(base_url.clone())
        };
        Self::with_session(base_url, config, session)
    }

    pub fn with_session(base_url: Url, config: &Config, session: SessionManager) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().cookie_provider(session.jar());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            client,
            session,
            handshake: Arc::new(Mutex::new(false)),
        })
    }

    /// `POST /chat`
    pub async fn chat(&self, message: &str) -> ApiResult<Answer> {
        let request = self
            .request(Method::POST, "chat")
            .json(&ChatRequest { message });
        let response: ChatResponse = self.send_json(request, "chat").await?;
        Ok(response.into())
    }

    /// `GET /history`
    pub async fn history(&self) -> ApiResult<Vec<HistoryEntry>> {
        self.send_json(self.request(Method::GET, "history"), "history").await
    }

    /// `POST /clear_history`
    pub async fn clear_history(&self) -> ApiResult<()> {
        self.send(self.request(Method::POST, "clear_history"), "clear_history")
            .await
            .map(|_| ())
    }

    /// `GET /export_history`
    pub async fn export_history(&self) -> ApiResult<Vec<HistoryEntry>> {
        self.send_json(self.request(Method::GET, "export_history"), "export_history")
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// The backend only assigns a user id on `GET /`; every API route reads it
    /// from the session cookie. Without one each request is a new user.
    async fn ensure_session(&self) {
        let mut answered = self.handshake.lock().await;
        if *answered || self.session.is_established() {
            return;
        }

        match self.client.get(self.endpoint("")).send().await {
            Ok(response) => {
                *answered = true;
                tracing::info!(
                    status = %response.status(),
                    established = self.session.is_established(),
                    "session handshake"
                );
            }
            Err(err) => tracing::warn!(error = %err, "session handshake failed"),
        }
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> ApiResult<Response> {
        self.ensure_session().await;
        let response = request.send().await.inspect_err(|err| {
            tracing::info!(path, error = %err, "backend unreachable");
        })?;
        let status = response.status();
        tracing::info!(path, %status, "backend replied");

        if let Err(err) = self.session.save().await {
            tracing::warn!(error = %err, "could not persist backend session");
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> ApiResult<T> {
        let response = self.send(request, path).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    Url::parse(raw.trim()).with_context(|| format!("Invalid backend URL: {}", raw))
}
