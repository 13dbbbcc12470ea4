//! The `studypath pathway` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use studypath_client::rest::Order;
use studypath_client::{RestProgressStore, ScoreWatcher};
use studypath_core::model::LectureSegment;
use studypath_core::pathway::Pathway;
use studypath_core::progress::ProgressSummary;
use studypath_core::session::PathwaySession;
use studypath_core::traits::ProgressStore;

pub async fn execute(
    lecture: i64,
    user: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, rest) = super::connect(config_path.as_ref())?;
    let user_id = super::require_user(&config, user)?;

    let segments: Vec<LectureSegment> = rest
        .select("lecture_segments")
        .eq("lecture_id", lecture)
        .order("sequence_number", Order::Ascending)
        .fetch()
        .await
        .context("failed to fetch lecture segments")?;
    anyhow::ensure!(!segments.is_empty(), "lecture {lecture} has no segments");

    let pathway = Pathway::from_segments(&segments).context("invalid pathway")?;

    let store = RestProgressStore::new(rest.clone(), user_id.clone());
    let watcher = ScoreWatcher::new(rest, user_id)
        .with_poll_interval(std::time::Duration::from_millis(config.poll_interval_ms));

    let session = PathwaySession::open(lecture, pathway, &store, &watcher).await?;
    print_pathway(&session);

    let completions = store.completions().await?;
    let quiz_progress = store.quiz_progress().await?;
    let summary =
        ProgressSummary::compute(&completions, &quiz_progress, chrono::Utc::now().date_naive());
    println!(
        "\nStreak: {} day(s)  XP: {}  Completed: {}  Lectures: {}",
        summary.streak_days, summary.total_xp, summary.completed_nodes, summary.lectures_touched
    );

    session.close();
    Ok(())
}

fn print_pathway(session: &PathwaySession) {
    let mut table = Table::new();
    table.set_header(vec!["Node", "Title", "Kind", "Difficulty", "XP", "Status"]);

    for node in session.pathway().nodes() {
        let state = session.status(&node.id);
        let status = state.map(|s| s.to_string()).unwrap_or_default();
        table.add_row(vec![
            Cell::new(&node.id),
            Cell::new(&node.title),
            Cell::new(node.kind),
            Cell::new(node.difficulty),
            Cell::new(format!("{}/10", session.score(&node.id))),
            Cell::new(status),
        ]);
    }

    println!("{table}");
}
