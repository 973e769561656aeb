// Thin HTTP client: bearer auth, base URL resolution and error normalisation.
// No retry, backoff or circuit breaking happens at this layer.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use reqwest::{Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{
    error::{ApiError, ClientError},
    token::TokenStore,
};

#[derive(Debug, Default)]
struct Counters {
    requests_sent: AtomicUsize,
    requests_succeeded: AtomicUsize,
    requests_failed: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenStore>>,
    counters: Arc<Counters>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout_ms: Option<u64>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        Url::parse(&base_url)
            .map_err(|e| ClientError::ConfigError(format!("base url `{base_url}`: {e}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(ms) = timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: None,
            counters: Arc::default(),
        })
    }

    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(store);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute `http(s)://` URLs pass through; anything else is joined onto
    /// the base URL with a single `/`.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            requests_sent: self.counters.requests_sent.load(Ordering::SeqCst),
            requests_succeeded: self.counters.requests_succeeded.load(Ordering::SeqCst),
            requests_failed: self.counters.requests_failed.load(Ordering::SeqCst),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::DELETE, path, None).await
    }

    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.counters.requests_sent.fetch_add(1, Ordering::SeqCst);

        let result = self.execute(method, path, body).await;
        match &result {
            Ok(_) => self.counters.requests_succeeded.fetch_add(1, Ordering::SeqCst),
            Err(_) => self.counters.requests_failed.fetch_add(1, Ordering::SeqCst),
        };
        result
    }

    async fn execute<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resolve_url(path);
        debug!(%method, %url, "sending request");

        let mut builder = self
            .http
            .request(method, &url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = self.tokens.as_ref().and_then(|store| store.token()) {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "request failed");
            return Err(ApiError::from_response(status, &text));
        }

        // empty 2xx bodies decode as JSON null, so `()` and `Option<_>` work
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }
}
