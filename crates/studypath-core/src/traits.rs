//! Core trait definitions for the hosted backend and the content generator.
//!
//! These async traits are implemented by the `studypath-client` and
//! `studypath-content` crates respectively. They are the seams that keep
//! the pure core testable without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::{
    segment_node_id, Flashcard, GeneratedQuestion, ProgressRecord, QuizConfig, QuizProgressRecord,
    ResourceNote,
};

// ---------------------------------------------------------------------------
// Progress store trait
// ---------------------------------------------------------------------------

/// Remote store for per-segment progress and quiz outcomes.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// All score rows for one lecture, newest first.
    async fn lecture_scores(&self, lecture_id: i64) -> anyhow::Result<Vec<ProgressRecord>>;

    /// Progress rows carrying a completion timestamp, newest first.
    async fn completions(&self) -> anyhow::Result<Vec<ProgressRecord>>;

    /// Every quiz-slot outcome for the current user, oldest first.
    async fn quiz_progress(&self) -> anyhow::Result<Vec<QuizProgressRecord>>;

    /// Upsert one quiz-slot outcome (keyed by user/lecture/segment/slot).
    async fn record_quiz_score(&self, record: &QuizProgressRecord) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Content generator trait
// ---------------------------------------------------------------------------

/// Remote service that generates study content from lecture material.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Human-readable generator name (e.g. "functions").
    fn name(&self) -> &str;

    /// Generate a quiz for a lecture.
    async fn generate_quiz(&self, request: &QuizRequest) -> anyhow::Result<Vec<GeneratedQuestion>>;

    /// Generate flashcards for a lecture.
    async fn generate_flashcards(
        &self,
        request: &FlashcardRequest,
    ) -> anyhow::Result<Vec<Flashcard>>;

    /// Generate additional-resource material for one segment.
    async fn generate_resources(&self, request: &ResourceRequest) -> anyhow::Result<ResourceNote>;
}

/// Request to generate a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub lecture_id: i64,
    pub config: QuizConfig,
}

/// Request to generate flashcards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardRequest {
    pub lecture_id: i64,
    pub count: u32,
}

/// Request to generate additional resources for a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    pub lecture_id: i64,
    pub segment_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Score change feed
// ---------------------------------------------------------------------------

/// A remote score change for one segment of one lecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub lecture_id: i64,
    pub segment_number: u32,
    pub score: u32,
}

impl ScoreEvent {
    /// Node identifier this event scores.
    pub fn node_id(&self) -> String {
        segment_node_id(self.segment_number)
    }
}

/// Source of score change notifications.
#[async_trait]
pub trait ScoreFeed: Send + Sync {
    /// Subscribe to score changes for one lecture.
    async fn subscribe(&self, lecture_id: i64) -> anyhow::Result<ScoreSubscription>;
}

/// A live subscription to score events.
///
/// Dropping the subscription tears the producing task down; `unsubscribe`
/// does the same explicitly.
pub struct ScoreSubscription {
    events: mpsc::Receiver<ScoreEvent>,
    task: JoinHandle<()>,
}

impl ScoreSubscription {
    pub fn new(events: mpsc::Receiver<ScoreEvent>, task: JoinHandle<()>) -> Self {
        Self { events, task }
    }

    /// Wait for the next event; `None` once the feed has shut down.
    pub async fn recv(&mut self) -> Option<ScoreEvent> {
        self.events.recv().await
    }

    /// Non-blocking receive of an already-delivered event.
    pub fn try_recv(&mut self) -> Option<ScoreEvent> {
        self.events.try_recv().ok()
    }

    /// Explicitly tear the subscription down.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for ScoreSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl futures::Stream for ScoreSubscription {
    type Item = ScoreEvent;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<ScoreEvent>> {
        self.get_mut().events.poll_recv(cx)
    }
}

impl std::fmt::Debug for ScoreSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreSubscription")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
