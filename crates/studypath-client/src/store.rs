//! `ProgressStore` implementation backed by the backend's tables.

use async_trait::async_trait;

use studypath_core::model::{ProgressRecord, QuizProgressRecord};
use studypath_core::traits::ProgressStore;

use crate::rest::{Order, RestClient};

/// Conflict target for quiz-slot upserts.
const QUIZ_PROGRESS_KEY: &str = "user_id,lecture_id,segment_number,quiz_number";

/// Progress store over the `user_progress` and `quiz_progress` tables,
/// scoped to one user.
pub struct RestProgressStore {
    rest: RestClient,
    user_id: String,
}

impl RestProgressStore {
    pub fn new(rest: RestClient, user_id: impl Into<String>) -> Self {
        Self {
            rest,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[async_trait]
impl ProgressStore for RestProgressStore {
    async fn lecture_scores(&self, lecture_id: i64) -> anyhow::Result<Vec<ProgressRecord>> {
        let records = self
            .rest
            .select("user_progress")
            .columns("segment_number,score")
            .eq("user_id", &self.user_id)
            .eq("lecture_id", lecture_id)
            .order("created_at", Order::Descending)
            .fetch()
            .await?;
        Ok(records)
    }

    async fn completions(&self) -> anyhow::Result<Vec<ProgressRecord>> {
        let records = self
            .rest
            .select("user_progress")
            .columns("segment_number,score,completed_at")
            .eq("user_id", &self.user_id)
            .not_null("completed_at")
            .order("completed_at", Order::Descending)
            .fetch()
            .await?;
        Ok(records)
    }

    async fn quiz_progress(&self) -> anyhow::Result<Vec<QuizProgressRecord>> {
        let records = self
            .rest
            .select("quiz_progress")
            .eq("user_id", &self.user_id)
            .order("completed_at", Order::Ascending)
            .fetch()
            .await?;
        Ok(records)
    }

    async fn record_quiz_score(&self, record: &QuizProgressRecord) -> anyhow::Result<()> {
        self.rest
            .upsert("quiz_progress", record, QUIZ_PROGRESS_KEY)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use chrono::Utc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> RestProgressStore {
        let rest = RestClient::new(&BackendConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            timeout_secs: 5,
        })
        .with_retries(0, Duration::from_millis(1));
        RestProgressStore::new(rest, "student-1")
    }

    #[tokio::test]
    async fn lecture_scores_scope_to_user_and_lecture() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/user_progress"))
            .and(query_param("user_id", "eq.student-1"))
            .and(query_param("lecture_id", "eq.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!([{"segment_number": 1, "score": 10}]),
            ))
            .mount(&server)
            .await;

        let records = store(&server).lecture_scores(7).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].node_id(), "segment_1");
    }

    #[tokio::test]
    async fn completions_filter_null_timestamps() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/user_progress"))
            .and(query_param("completed_at", "not.is.null"))
            .and(query_param("order", "completed_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let records = store(&server).completions().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn record_quiz_score_upserts_on_slot_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/quiz_progress"))
            .and(query_param("on_conflict", QUIZ_PROGRESS_KEY))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let record = QuizProgressRecord {
            id: None,
            user_id: Some("student-1".into()),
            lecture_id: Some(7),
            segment_number: 1,
            quiz_number: 2,
            quiz_score: Some(5),
            completed_at: Some(Utc::now()),
        };
        store(&server).record_quiz_score(&record).await.unwrap();
    }
}
