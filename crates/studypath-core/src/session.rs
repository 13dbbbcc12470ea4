//! Pathway view session: local score state plus the live change feed.
//!
//! A session owns the score map for one lecture's pathway. Remote updates
//! arrive on the score subscription and are merged last-write-wins; the
//! subscription is torn down when the session is closed or dropped.

use anyhow::Result;
use uuid::Uuid;

use crate::model::LessonNode;
use crate::pathway::Pathway;
use crate::progress::{evaluate, status, NodeState, NodeStatus, ScoreMap};
use crate::traits::{ProgressStore, ScoreEvent, ScoreFeed, ScoreSubscription};

/// Why a node cannot be entered right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedNode {
    /// Titles of the prerequisites still below the mastery threshold.
    pub missing_prerequisites: Vec<String>,
}

/// The state of one open pathway view.
pub struct PathwaySession {
    id: Uuid,
    lecture_id: i64,
    pathway: Pathway,
    scores: ScoreMap,
    subscription: Option<ScoreSubscription>,
}

impl PathwaySession {
    /// Open a session: load current scores, then subscribe to changes.
    pub async fn open(
        lecture_id: i64,
        pathway: Pathway,
        store: &dyn ProgressStore,
        feed: &dyn ScoreFeed,
    ) -> Result<Self> {
        let records = store.lecture_scores(lecture_id).await?;
        let scores = ScoreMap::from_progress(&records);
        let subscription = feed.subscribe(lecture_id).await?;

        tracing::debug!(
            lecture_id,
            nodes = pathway.len(),
            scored = scores.len(),
            "pathway session opened"
        );

        Ok(Self {
            id: Uuid::new_v4(),
            lecture_id,
            pathway,
            scores,
            subscription: Some(subscription),
        })
    }

    /// A session without a live feed, for offline evaluation.
    pub fn detached(lecture_id: i64, pathway: Pathway, scores: ScoreMap) -> Self {
        Self {
            id: Uuid::new_v4(),
            lecture_id,
            pathway,
            scores,
            subscription: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lecture_id(&self) -> i64 {
        self.lecture_id
    }

    pub fn pathway(&self) -> &Pathway {
        &self.pathway
    }

    pub fn score(&self, node_id: &str) -> u32 {
        self.scores.score(node_id)
    }

    pub fn status(&self, node_id: &str) -> Option<NodeStatus> {
        self.pathway.get(node_id).map(|n| status(n, &self.scores))
    }

    /// Evaluate every node against the current scores.
    pub fn states(&self) -> Vec<NodeState> {
        evaluate(&self.pathway, &self.scores)
    }

    /// Merge one score event, last-write-wins. Events for other lectures
    /// are ignored.
    pub fn apply(&mut self, event: ScoreEvent) {
        if event.lecture_id != self.lecture_id {
            return;
        }
        self.scores.apply(&event);
    }

    /// Merge every event already delivered by the feed, without blocking.
    /// Returns the number of events drained.
    pub fn absorb_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.subscription.as_mut().and_then(|s| s.try_recv()) {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next remote change and merge it. Returns the updated
    /// state of the affected node, or `None` once the feed has shut down.
    pub async fn next_change(&mut self) -> Option<NodeState> {
        let event = self.subscription.as_mut()?.recv().await?;
        let node_id = event.node_id();
        self.apply(event);
        let node = self.pathway.get(&node_id)?;
        Some(NodeState {
            node_id: node_id.clone(),
            score: self.scores.score(&node_id),
            status: status(node, &self.scores),
        })
    }

    /// Explain why a node is locked: the prerequisites still unmastered.
    pub fn locked_reason(&self, node: &LessonNode) -> Option<LockedNode> {
        if status(node, &self.scores) != NodeStatus::Locked {
            return None;
        }
        let missing = node
            .prerequisites
            .iter()
            .filter(|p| self.scores.score(p) < crate::model::MASTERY_THRESHOLD)
            .map(|p| {
                self.pathway
                    .get(p)
                    .map(|n| n.title.clone())
                    .unwrap_or_else(|| p.clone())
            })
            .collect();
        Some(LockedNode {
            missing_prerequisites: missing,
        })
    }

    /// Tear the session down, dropping the subscription.
    pub fn close(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        tracing::debug!(lecture_id = self.lecture_id, "pathway session closed");
    }
}
