//! Flashcard ensure flow: fetch saved cards, generating and persisting a
//! fresh set when the lecture has none yet.

use anyhow::{Context, Result};
use serde::Serialize;

use studypath_client::rest::Order;
use studypath_client::RestClient;
use studypath_core::model::Flashcard;
use studypath_core::traits::{ContentGenerator, FlashcardRequest};

/// Default number of flashcards generated for a new lecture.
pub const DEFAULT_FLASHCARD_COUNT: u32 = 6;

#[derive(Serialize)]
struct NewFlashcard<'a> {
    lecture_id: i64,
    question: &'a str,
    answer: &'a str,
}

/// Return the lecture's flashcards, generating them on first access.
pub async fn ensure_flashcards(
    rest: &RestClient,
    generator: &dyn ContentGenerator,
    lecture_id: i64,
    count: u32,
) -> Result<Vec<Flashcard>> {
    let saved: Vec<Flashcard> = rest
        .select("flashcards")
        .eq("lecture_id", lecture_id)
        .order("id", Order::Ascending)
        .fetch()
        .await
        .context("failed to fetch flashcards")?;

    if !saved.is_empty() {
        return Ok(saved);
    }

    tracing::info!(lecture_id, count, "no saved flashcards, generating");
    let generated = generator
        .generate_flashcards(&FlashcardRequest { lecture_id, count })
        .await
        .context("failed to generate flashcards")?;

    if generated.is_empty() {
        return Ok(generated);
    }

    let rows: Vec<NewFlashcard<'_>> = generated
        .iter()
        .map(|card| NewFlashcard {
            lecture_id,
            question: &card.question,
            answer: &card.answer,
        })
        .collect();
    rest.insert("flashcards", &rows)
        .await
        .context("failed to save flashcards")?;

    Ok(generated
        .into_iter()
        .map(|card| Flashcard {
            lecture_id: Some(lecture_id),
            ..card
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use studypath_client::config::BackendConfig;
    use studypath_content::MockGenerator;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rest(server: &MockServer) -> RestClient {
        RestClient::new(&BackendConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            timeout_secs: 5,
        })
        .with_retries(0, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn saved_cards_short_circuit_generation() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/flashcards"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "lecture_id": 7, "question": "Q?", "answer": "A."}
            ])))
            .mount(&server)
            .await;

        let generator = MockGenerator::new();
        let cards = ensure_flashcards(&rest(&server), &generator, 7, 6)
            .await
            .unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_lecture_generates_and_persists() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/flashcards"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/flashcards"))
            .and(body_partial_json(
                serde_json::json!([{"lecture_id": 7, "question": "Placeholder question 0?"}]),
            ))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let generator = MockGenerator::new();
        let cards = ensure_flashcards(&rest(&server), &generator, 7, 2)
            .await
            .unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(generator.call_count(), 1);
        assert!(cards.iter().all(|c| c.lecture_id == Some(7)));
    }

    #[tokio::test]
    async fn failed_save_surfaces_the_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/flashcards"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/flashcards"))
            .respond_with(ResponseTemplate::new(500).set_body_json(
                serde_json::json!({"message": "insert rejected"}),
            ))
            .mount(&server)
            .await;

        let generator = MockGenerator::new();
        let err = ensure_flashcards(&rest(&server), &generator, 7, 2)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("save"));
    }
}
