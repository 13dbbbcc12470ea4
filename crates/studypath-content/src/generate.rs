//! Hosted-function client for content generation.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use studypath_core::error::BackendError;
use studypath_core::model::{Flashcard, GeneratedQuestion, ResourceNote};
use studypath_core::traits::{ContentGenerator, FlashcardRequest, QuizRequest, ResourceRequest};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Client for the backend's content-generation functions.
pub struct ContentClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct QuizResponse {
    quiz: Vec<GeneratedQuestion>,
}

#[derive(Deserialize)]
struct FlashcardsResponse {
    flashcards: Vec<Flashcard>,
}

#[derive(Deserialize)]
struct ResourcesResponse {
    content: String,
}

#[derive(Deserialize)]
struct FunctionError {
    message: String,
}

impl ContentClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self::with_timeout(api_key, base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(api_key: &str, base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs: timeout.as_secs(),
        }
    }

    async fn invoke<B, R>(&self, function: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/functions/v1/{function}", self.base_url))
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout_secs)
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(BackendError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::AuthenticationFailed(body));
        }
        if status == 404 {
            return Err(BackendError::NotFound(function.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<FunctionError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(BackendError::ApiError { status, message });
        }

        response.json().await.map_err(|e| BackendError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })
    }
}

#[async_trait]
impl ContentGenerator for ContentClient {
    fn name(&self) -> &str {
        "functions"
    }

    #[instrument(skip(self, request), fields(lecture_id = request.lecture_id))]
    async fn generate_quiz(&self, request: &QuizRequest) -> anyhow::Result<Vec<GeneratedQuestion>> {
        let response: QuizResponse = self.invoke("generate-quiz", request).await?;
        Ok(response.quiz)
    }

    #[instrument(skip(self, request), fields(lecture_id = request.lecture_id))]
    async fn generate_flashcards(
        &self,
        request: &FlashcardRequest,
    ) -> anyhow::Result<Vec<Flashcard>> {
        let response: FlashcardsResponse = self.invoke("generate-flashcards", request).await?;
        Ok(response.flashcards)
    }

    #[instrument(skip(self, request), fields(segment_id = request.segment_id))]
    async fn generate_resources(&self, request: &ResourceRequest) -> anyhow::Result<ResourceNote> {
        let response: ResourcesResponse = self.invoke("generate-resources", request).await?;
        Ok(ResourceNote {
            id: None,
            lecture_id: request.lecture_id,
            title: request.title.clone(),
            content: response.content,
        })
    }
}
