//! HTTP-backed data services over the scoring backend's JSON API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::error::FetchError;
use crate::records::{
    ApiResponse, AssessmentRecord, ExplainOptions, ExplanationRecord, UserProfile,
};
use crate::service::retry::{is_retryable_http_error, retry_fetch, RetryConfig};
use crate::service::{ExplanationService, ProfileService};
use std::time::Duration;

/// Shared reqwest plumbing for both services.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: String,
    retry: RetryConfig,
}

impl HttpBackend {
    pub fn new(base: &str, timeout_secs: u64, retry: RetryConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Map a non-success status onto FetchError before any body decoding.
    /// Transient statuses (408, 429, 500, 502-504) become retryable Network
    /// errors; everything else non-success is a Server verdict.
    fn classify_status(status: StatusCode) -> Option<FetchError> {
        if status == StatusCode::NOT_FOUND {
            return Some(FetchError::NotFound);
        }
        if is_retryable_http_error(status.as_u16()) {
            return Some(FetchError::Network(format!("server returned {}", status)));
        }
        if !status.is_success() {
            return Some(FetchError::Server(format!("server returned {}", status)));
        }
        None
    }

    /// Decode the `{ success, data, message }` envelope, mapping the failure
    /// cases onto FetchError.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, FetchError> {
        if let Some(err) = Self::classify_status(response.status()) {
            return Err(err);
        }
        let envelope: ApiResponse<T> = response.json().await?;
        if envelope.success {
            envelope
                .data
                .ok_or_else(|| FetchError::Server("response envelope missing data".to_string()))
        } else {
            Err(FetchError::Server(
                envelope
                    .message
                    .unwrap_or_else(|| "request rejected".to_string()),
            ))
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        retry_fetch(&self.retry, path, || async {
            let response = self.client.get(&url).send().await?;
            Self::decode(response).await
        })
        .await
    }
}

pub struct HttpExplanationService {
    backend: HttpBackend,
}

impl HttpExplanationService {
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ExplanationService for HttpExplanationService {
    async fn fetch(&self, explanation_id: &str) -> Result<ExplanationRecord, FetchError> {
        self.backend
            .get(&format!("explanation/{}", explanation_id))
            .await
    }

    async fn generate(
        &self,
        scoring_id: &str,
        options: &ExplainOptions,
    ) -> Result<ExplanationRecord, FetchError> {
        let url = self.backend.url(&format!("explain-score/{}", scoring_id));
        let body = json!({ "options": options });
        retry_fetch(&self.backend.retry, "explain-score", || async {
            let response = self.backend.client.post(&url).json(&body).send().await?;
            HttpBackend::decode(response).await
        })
        .await
    }
}

pub struct HttpProfileService {
    backend: HttpBackend,
}

impl HttpProfileService {
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ProfileService for HttpProfileService {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, FetchError> {
        self.backend.get(&format!("user/{}/profile", user_id)).await
    }

    async fn fetch_assessments(&self, user_id: &str) -> Result<Vec<AssessmentRecord>, FetchError> {
        self.backend
            .get(&format!("user/{}/assessments", user_id))
            .await
    }
}
