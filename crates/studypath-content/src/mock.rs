//! Mock content generator for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use studypath_core::model::{Flashcard, GeneratedQuestion, QuestionKind, ResourceNote};
use studypath_core::traits::{ContentGenerator, FlashcardRequest, QuizRequest, ResourceRequest};

/// A mock generator for exercising flows without real service calls.
///
/// Returns configurable responses keyed by lecture identifier.
pub struct MockGenerator {
    /// Per-lecture quiz responses.
    quizzes: HashMap<i64, Vec<GeneratedQuestion>>,
    /// Per-lecture flashcard responses.
    flashcards: HashMap<i64, Vec<Flashcard>>,
    /// Number of calls made, across all operations.
    call_count: AtomicU32,
    /// Last quiz request received.
    last_quiz_request: Mutex<Option<QuizRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            quizzes: HashMap::new(),
            flashcards: HashMap::new(),
            call_count: AtomicU32::new(0),
            last_quiz_request: Mutex::new(None),
        }
    }

    /// Register a quiz response for a lecture.
    pub fn with_quiz(mut self, lecture_id: i64, questions: Vec<GeneratedQuestion>) -> Self {
        self.quizzes.insert(lecture_id, questions);
        self
    }

    /// Register a flashcard response for a lecture.
    pub fn with_flashcards(mut self, lecture_id: i64, cards: Vec<Flashcard>) -> Self {
        self.flashcards.insert(lecture_id, cards);
        self
    }

    /// Get the number of calls made to this generator.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last quiz request made to this generator.
    pub fn last_quiz_request(&self) -> Option<QuizRequest> {
        self.last_quiz_request.lock().unwrap().clone()
    }

    fn placeholder_question(index: u32) -> GeneratedQuestion {
        GeneratedQuestion {
            question: format!("Placeholder question {index}?"),
            kind: QuestionKind::TrueFalse,
            options: vec!["True".into(), "False".into()],
            correct_answer: "True".into(),
            hint: None,
            explanation: None,
        }
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_quiz(&self, request: &QuizRequest) -> anyhow::Result<Vec<GeneratedQuestion>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_quiz_request.lock().unwrap() = Some(request.clone());

        Ok(self
            .quizzes
            .get(&request.lecture_id)
            .cloned()
            .unwrap_or_else(|| {
                (0..request.config.count)
                    .map(Self::placeholder_question)
                    .collect()
            }))
    }

    async fn generate_flashcards(
        &self,
        request: &FlashcardRequest,
    ) -> anyhow::Result<Vec<Flashcard>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        Ok(self
            .flashcards
            .get(&request.lecture_id)
            .cloned()
            .unwrap_or_else(|| {
                (0..request.count)
                    .map(|i| Flashcard {
                        id: None,
                        lecture_id: Some(request.lecture_id),
                        question: format!("Placeholder question {i}?"),
                        answer: format!("Placeholder answer {i}."),
                    })
                    .collect()
            }))
    }

    async fn generate_resources(&self, request: &ResourceRequest) -> anyhow::Result<ResourceNote> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        Ok(ResourceNote {
            id: None,
            lecture_id: request.lecture_id,
            title: request.title.clone(),
            content: format!("## {}\n\nPlaceholder resources.", request.title),
        })
    }
}
