//! The `studypath generate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use studypath_content::{ContentClient, QuizConfigCache};
use studypath_core::model::QuizConfig;
use studypath_core::traits::{ContentGenerator, QuizRequest};
use studypath_flows::ensure_flashcards;

pub async fn execute(
    kind: String,
    lecture: i64,
    count: u32,
    time_limit: u32,
    hints: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, rest) = super::connect(config_path.as_ref())?;
    let generator = ContentClient::new(&config.backend.api_key, &config.backend.base_url);

    match kind.as_str() {
        "quiz" => {
            let quiz_config = QuizConfig {
                count,
                time_limit,
                hints_enabled: hints,
            };

            // The chosen configuration is what the quiz view replays later.
            let mut cache = QuizConfigCache::open(&config.cache_dir)?;
            cache.store(lecture, quiz_config.clone())?;

            let questions = generator
                .generate_quiz(&QuizRequest {
                    lecture_id: lecture,
                    config: quiz_config,
                })
                .await?;

            let mut table = Table::new();
            table.set_header(vec!["#", "Question", "Kind", "Answer"]);
            for (i, q) in questions.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(&q.question),
                    Cell::new(format!("{:?}", q.kind)),
                    Cell::new(&q.correct_answer),
                ]);
            }
            println!("{table}");
            println!("\n{} question(s) generated.", questions.len());
        }
        "flashcards" => {
            let cards = ensure_flashcards(&rest, &generator, lecture, count).await?;

            let mut table = Table::new();
            table.set_header(vec!["#", "Question", "Answer"]);
            for (i, card) in cards.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(&card.question),
                    Cell::new(&card.answer),
                ]);
            }
            println!("{table}");
            println!("\n{} flashcard(s) ready.", cards.len());
        }
        other => {
            anyhow::bail!("unknown kind '{other}' (expected: quiz, flashcards)");
        }
    }

    Ok(())
}
