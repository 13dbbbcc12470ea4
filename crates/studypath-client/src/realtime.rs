//! Score change feed.
//!
//! The backend's push protocol is not part of the public contract; the
//! watcher realizes the typed `ScoreFeed` channel by polling the score
//! table and emitting an event per changed row. Swapping in a true push
//! transport only touches this module.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use studypath_core::error::BackendError;
use studypath_core::model::ProgressRecord;
use studypath_core::traits::{ScoreEvent, ScoreFeed, ScoreSubscription};

use crate::rest::{Order, RestClient};

/// Channel capacity for in-flight score events.
const EVENT_BUFFER: usize = 64;

/// Polls the score table and emits typed change events.
pub struct ScoreWatcher {
    rest: RestClient,
    user_id: String,
    poll_interval: Duration,
}

impl ScoreWatcher {
    pub fn new(rest: RestClient, user_id: impl Into<String>) -> Self {
        Self {
            rest,
            user_id: user_id.into(),
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait]
impl ScoreFeed for ScoreWatcher {
    async fn subscribe(&self, lecture_id: i64) -> anyhow::Result<ScoreSubscription> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        // Subscribing must not replay scores that already existed.
        let mut baseline = fetch_scores(&self.rest, &self.user_id, lecture_id).await?;

        let rest = self.rest.clone();
        let user_id = self.user_id.clone();
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(poll_interval).await;
                match fetch_scores(&rest, &user_id, lecture_id).await {
                    Ok(current) => {
                        for event in diff_scores(lecture_id, &baseline, &current) {
                            if tx.send(event).await.is_err() {
                                // Receiver gone; the subscription was dropped.
                                return;
                            }
                        }
                        baseline = current;
                    }
                    Err(e) => {
                        tracing::warn!(lecture_id, error = %e, "score poll failed");
                    }
                }
            }
        });

        Ok(ScoreSubscription::new(rx, task))
    }
}

async fn fetch_scores(
    rest: &RestClient,
    user_id: &str,
    lecture_id: i64,
) -> Result<BTreeMap<u32, u32>, BackendError> {
    let records: Vec<ProgressRecord> = rest
        .select("user_progress")
        .columns("segment_number,score")
        .eq("user_id", user_id)
        .eq("lecture_id", lecture_id)
        .order("segment_number", Order::Ascending)
        .fetch()
        .await?;

    Ok(records
        .into_iter()
        .map(|r| (r.segment_number, r.score.unwrap_or(0)))
        .collect())
}

/// Events for rows that appeared or changed. Rows that vanished emit
/// nothing, matching the original subscription's insert/update handling.
fn diff_scores(
    lecture_id: i64,
    old: &BTreeMap<u32, u32>,
    new: &BTreeMap<u32, u32>,
) -> Vec<ScoreEvent> {
    new.iter()
        .filter(|&(segment, score)| old.get(segment) != Some(score))
        .map(|(&segment_number, &score)| ScoreEvent {
            lecture_id,
            segment_number,
            score,
        })
        .collect()
}
