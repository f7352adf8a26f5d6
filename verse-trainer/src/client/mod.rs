//! HTTP client for the verse-server API
//!
//! Every call runs with the configured timeout and is retried on network
//! failures. Progress calls are scoped to the client's user id.

mod error;
mod retry;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use verse_common::config::ClientConfig;
use verse_common::model::{LearningProgress, NewPoem, Poem, PoemProgress, TestProgress, UserProgress};
use verse_common::time::{self, millis_to_duration};

pub use error::{ClientError, ErrorKind};
pub use retry::{with_retry, RetryPolicy};

const USER_AGENT: &str = concat!("verse-trainer/", env!("CARGO_PKG_VERSION"));

/// Body of `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::with_message(ErrorKind::Unknown, e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
            retry,
        })
    }

    pub fn from_config(config: &ClientConfig, user_id: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(
            config.api_url.clone(),
            user_id,
            millis_to_duration(config.timeout_ms),
            RetryPolicy {
                max_retries: config.max_retries,
                base_delay: millis_to_duration(config.retry_delay_ms),
            },
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    // ------------------------------------------------------------------
    // Poems
    // ------------------------------------------------------------------

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.call("health", Method::GET, "/health", None).await
    }

    pub async fn fetch_poems(&self) -> Result<Vec<Poem>, ClientError> {
        self.call("fetch poems", Method::GET, "/poems", None).await
    }

    pub async fn add_poem(&self, poem: &NewPoem) -> Result<Poem, ClientError> {
        let body = to_body(poem)?;
        let created: Poem = self.call("add poem", Method::POST, "/poems", Some(&body)).await?;
        tracing::info!(poem_id = %created.id, title = %created.title, "Poem uploaded");
        Ok(created)
    }

    pub async fn delete_poem(&self, poem_id: &str) -> Result<(), ClientError> {
        let path = format!("/poems/{}", poem_id);
        let _: Value = self.call("delete poem", Method::DELETE, &path, None).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Progress
    // ------------------------------------------------------------------

    /// Stored progress for one poem; `None` if nothing was saved yet
    pub async fn fetch_progress(&self, poem_id: &str) -> Result<Option<PoemProgress>, ClientError> {
        let path = self.progress_path(Some(poem_id));
        self.call("fetch progress", Method::GET, &path, None).await
    }

    pub async fn fetch_all_progress(&self) -> Result<UserProgress, ClientError> {
        let path = self.progress_path(None);
        self.call("fetch all progress", Method::GET, &path, None).await
    }

    /// Replace the stored entry for one poem
    pub async fn save_progress(
        &self,
        poem_id: &str,
        progress: &PoemProgress,
    ) -> Result<PoemProgress, ClientError> {
        let path = self.progress_path(Some(poem_id));
        let body = to_body(progress)?;
        self.call("save progress", Method::PUT, &path, Some(&body)).await
    }

    pub async fn delete_progress(&self, poem_id: &str) -> Result<(), ClientError> {
        let path = self.progress_path(Some(poem_id));
        let _: Value = self.call("delete progress", Method::DELETE, &path, None).await?;
        Ok(())
    }

    /// Save learning progress, keeping any stored test outcome
    pub async fn save_learning_progress(
        &self,
        poem_id: &str,
        mut learning: LearningProgress,
    ) -> Result<PoemProgress, ClientError> {
        learning.last_updated = Some(time::now());
        let mut entry = self.fetch_progress(poem_id).await?.unwrap_or_default();
        entry.learning = Some(learning);
        self.save_progress(poem_id, &entry).await
    }

    /// Save a test outcome, keeping any stored learning progress
    pub async fn save_test_progress(
        &self,
        poem_id: &str,
        mut test: TestProgress,
    ) -> Result<PoemProgress, ClientError> {
        test.last_updated = Some(time::now());
        let mut entry = self.fetch_progress(poem_id).await?.unwrap_or_default();
        entry.test = Some(test);
        self.save_progress(poem_id, &entry).await
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    fn progress_path(&self, poem_id: Option<&str>) -> String {
        match poem_id {
            Some(poem_id) => format!("/progress/{}/{}", self.user_id, poem_id),
            None => format!("/progress/{}", self.user_id),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        // The client timeout spans the whole attempt, body read included
        with_retry(operation, &self.retry, move || {
            self.send_once(method.clone(), url, body)
        })
        .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        tracing::debug!(method = %method, url = %url, "Sending request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            // A timeout while reading the error body is still a network failure
            let bytes = response.bytes().await?;
            let body = serde_json::from_slice::<Value>(&bytes).ok();
            let err = ClientError::from_response(status, body.as_ref());
            tracing::debug!(status = status.as_u16(), kind = %err.kind, "Request rejected");
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ClientError::with_message(ErrorKind::Unknown, format!("Could not read server response: {}", e))
            } else {
                ClientError::from(e)
            }
        })
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, ClientError> {
    serde_json::to_value(value)
        .map_err(|e| ClientError::with_message(ErrorKind::Unknown, e.to_string()))
}
