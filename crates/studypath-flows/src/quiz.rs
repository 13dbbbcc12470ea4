//! Segment quiz runner: the pure slot machine plus remote persistence.
//!
//! Every answer is persisted before the local state transition, so a failed
//! write leaves the machine unchanged and the caller can retry the slot.

use anyhow::{Context, Result};
use chrono::Utc;

use studypath_core::model::{QuizProgressRecord, QUIZ_SLOT_POINTS};
use studypath_core::quiz::{QuizOutcome, SegmentQuiz};
use studypath_core::traits::ProgressStore;

/// Drives the two-slot quiz of one segment against the progress store.
pub struct SegmentQuizRunner<'a> {
    store: &'a dyn ProgressStore,
    user_id: String,
    lecture_id: i64,
    segment_number: u32,
    state: SegmentQuiz,
}

impl<'a> SegmentQuizRunner<'a> {
    pub fn new(
        store: &'a dyn ProgressStore,
        user_id: impl Into<String>,
        lecture_id: i64,
        segment_number: u32,
    ) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            lecture_id,
            segment_number,
            state: SegmentQuiz::new(),
        }
    }

    pub fn state(&self) -> &SegmentQuiz {
        &self.state
    }

    /// Record an answer for a 0-based slot: persist the slot score, then
    /// advance the state machine.
    pub async fn submit(&mut self, slot: usize, correct: bool) -> Result<QuizOutcome> {
        let quiz_score = if correct { QUIZ_SLOT_POINTS } else { 0 };
        let record = QuizProgressRecord {
            id: None,
            user_id: Some(self.user_id.clone()),
            lecture_id: Some(self.lecture_id),
            segment_number: self.segment_number,
            quiz_number: slot as u32 + 1,
            quiz_score: Some(quiz_score),
            completed_at: Some(Utc::now()),
        };
        self.store
            .record_quiz_score(&record)
            .await
            .context("failed to save quiz progress")?;

        let outcome = if correct {
            self.state.answer_correct(slot)
        } else {
            self.state.answer_wrong(slot)
        };
        tracing::debug!(
            segment = self.segment_number,
            slot,
            correct,
            ?outcome,
            "quiz slot answered"
        );
        Ok(outcome)
    }

    /// Start a retake of the failed slots; returns the first slot to retry.
    pub fn begin_retake(&mut self) -> Option<usize> {
        self.state.begin_retake()
    }
}
