//! Quiz state machines.
//!
//! Two machines live here: the per-segment two-slot quiz that gates pathway
//! mastery, and the timed session for generated quizzes. Both are pure;
//! remote persistence happens in `studypath-flows`.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{GeneratedQuestion, QuizConfig, QUIZ_SLOTS_PER_SEGMENT};

/// State of a single quiz slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Unanswered,
    AnsweredCorrect,
    AnsweredWrong,
}

/// What the caller should do after an answer is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizOutcome {
    /// Move on to the next slot (or the following content).
    Advance,
    /// Final slot answered correctly with no outstanding failures.
    Mastered,
    /// Final slot answered correctly, but failed slots remain; offer a
    /// retake instead of marking the segment complete.
    RetryFailed { failed_slots: Vec<usize> },
}

/// The two-slot quiz state for one lecture segment.
///
/// Slots are 0-based here; the persisted `quiz_number` is 1-based.
#[derive(Debug, Clone, Default)]
pub struct SegmentQuiz {
    answered: BTreeSet<usize>,
    failed: BTreeSet<usize>,
}

impl SegmentQuiz {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot_state(&self, slot: usize) -> SlotState {
        if self.failed.contains(&slot) {
            SlotState::AnsweredWrong
        } else if self.answered.contains(&slot) {
            SlotState::AnsweredCorrect
        } else {
            SlotState::Unanswered
        }
    }

    pub fn is_answered(&self, slot: usize) -> bool {
        self.answered.contains(&slot)
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn failed_slots(&self) -> Vec<usize> {
        self.failed.iter().copied().collect()
    }

    /// Record a correct answer for `slot`.
    ///
    /// Clears the slot from the failed set first; the failed set is only
    /// consulted afterwards, so re-answering a previously failed final slot
    /// correctly can still master the segment.
    pub fn answer_correct(&mut self, slot: usize) -> QuizOutcome {
        self.answered.insert(slot);
        self.failed.remove(&slot);

        if slot + 1 >= QUIZ_SLOTS_PER_SEGMENT {
            if self.failed.is_empty() {
                QuizOutcome::Mastered
            } else {
                QuizOutcome::RetryFailed {
                    failed_slots: self.failed_slots(),
                }
            }
        } else {
            QuizOutcome::Advance
        }
    }

    /// Record a wrong answer for `slot`; always auto-advances.
    pub fn answer_wrong(&mut self, slot: usize) -> QuizOutcome {
        self.answered.insert(slot);
        self.failed.insert(slot);
        QuizOutcome::Advance
    }

    /// Start a retake of the failed slots: un-answer them and return the
    /// first slot to retry.
    pub fn begin_retake(&mut self) -> Option<usize> {
        let first = self.failed.iter().next().copied()?;
        for slot in &self.failed {
            self.answered.remove(slot);
        }
        Some(first)
    }
}

// ---------------------------------------------------------------------------
// Timed generated-quiz sessions
// ---------------------------------------------------------------------------

/// Final score of a generated quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl std::fmt::Display for QuizScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

/// A timed session over generated questions.
///
/// The countdown ticks once per second; reaching zero submits the quiz.
/// After submission answers are frozen and the score is final.
#[derive(Debug, Clone)]
pub struct GeneratedQuizSession {
    questions: Vec<GeneratedQuestion>,
    answers: HashMap<usize, String>,
    hints_enabled: bool,
    remaining_secs: u32,
    submitted: bool,
}

impl GeneratedQuizSession {
    pub fn new(questions: Vec<GeneratedQuestion>, config: &QuizConfig) -> Self {
        Self {
            questions,
            answers: HashMap::new(),
            hints_enabled: config.hints_enabled,
            remaining_secs: config.time_limit * 60,
            submitted: false,
        }
    }

    pub fn questions(&self) -> &[GeneratedQuestion] {
        &self.questions
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Remaining time formatted as `m:ss`.
    pub fn format_remaining(&self) -> String {
        format!("{}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    /// Record an answer for a question. Ignored once submitted.
    pub fn answer(&mut self, question: usize, choice: impl Into<String>) {
        if self.submitted || question >= self.questions.len() {
            return;
        }
        self.answers.insert(question, choice.into());
    }

    pub fn answer_for(&self, question: usize) -> Option<&str> {
        self.answers.get(&question).map(String::as_str)
    }

    /// Hint text, only when hints are enabled for this session.
    pub fn hint(&self, question: usize) -> Option<&str> {
        if !self.hints_enabled {
            return None;
        }
        self.questions.get(question)?.hint.as_deref()
    }

    /// Advance the countdown by one second; submits when time runs out.
    pub fn tick(&mut self) {
        if self.submitted {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.submit();
        }
    }

    pub fn submit(&mut self) {
        self.submitted = true;
    }

    pub fn is_correct(&self, question: usize) -> bool {
        match (self.questions.get(question), self.answers.get(&question)) {
            (Some(q), Some(answer)) => *answer == q.correct_answer,
            _ => false,
        }
    }

    /// Score as answered-correct over total questions.
    pub fn score(&self) -> QuizScore {
        let correct = (0..self.questions.len())
            .filter(|&i| self.is_correct(i))
            .count();
        QuizScore {
            correct,
            total: self.questions.len(),
        }
    }
}
