//! Unlock evaluation, score maps, and streak scoring.
//!
//! Node status is a pure function of the score map and the prerequisite
//! graph; nothing here holds hidden state. Remote score updates are merged
//! last-write-wins per node identifier.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{LessonNode, ProgressRecord, QuizProgressRecord, MASTERY_THRESHOLD};
use crate::pathway::Pathway;
use crate::traits::ScoreEvent;

/// Derived availability of a pathway node. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Locked,
    Available,
    Completed,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Locked => write!(f, "locked"),
            NodeStatus::Available => write!(f, "available"),
            NodeStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Accumulated scores keyed by node identifier.
///
/// Insertion order is irrelevant; a missing entry reads as 0.
#[derive(Debug, Clone, Default)]
pub struct ScoreMap {
    scores: HashMap<String, u32>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a score map from progress rows, keeping the last write per node.
    pub fn from_progress(records: &[ProgressRecord]) -> Self {
        let mut map = Self::new();
        for record in records {
            map.record(record.node_id(), record.score.unwrap_or(0));
        }
        map
    }

    /// Score for a node; missing scores read as 0.
    pub fn score(&self, node_id: &str) -> u32 {
        self.scores.get(node_id).copied().unwrap_or(0)
    }

    /// Overwrite the score for a node (last write wins).
    pub fn record(&mut self, node_id: String, score: u32) {
        self.scores.insert(node_id, score);
    }

    /// Merge a remote score event, last-write-wins per node identifier.
    pub fn apply(&mut self, event: &ScoreEvent) {
        self.record(event.node_id(), event.score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Evaluate the status of a single node against a score map.
///
/// `Completed` iff the node's own score reached the mastery threshold;
/// otherwise `Available` iff every prerequisite reached the threshold
/// (vacuously true for an empty prerequisite list); otherwise `Locked`.
pub fn status(node: &LessonNode, scores: &ScoreMap) -> NodeStatus {
    if scores.score(&node.id) >= MASTERY_THRESHOLD {
        return NodeStatus::Completed;
    }
    let unlocked = node
        .prerequisites
        .iter()
        .all(|prereq| scores.score(prereq) >= MASTERY_THRESHOLD);
    if unlocked {
        NodeStatus::Available
    } else {
        NodeStatus::Locked
    }
}

/// The evaluated state of one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    pub node_id: String,
    pub score: u32,
    pub status: NodeStatus,
}

/// Evaluate every node of a pathway, in pathway order.
pub fn evaluate(pathway: &Pathway, scores: &ScoreMap) -> Vec<NodeState> {
    pathway
        .nodes()
        .iter()
        .map(|node| NodeState {
            node_id: node.id.clone(),
            score: scores.score(&node.id),
            status: status(node, scores),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Streaks
// ---------------------------------------------------------------------------

/// Count consecutive days with at least one completion, ending at `today`.
///
/// Each timestamp is normalized to its UTC calendar day; the count walks
/// backwards from `today` and stops at the first missing day. A completion
/// yesterday but not today yields 0.
pub fn streak_as_of<I>(today: NaiveDate, completions: I) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days: HashSet<NaiveDate> = completions.into_iter().map(|t| t.date_naive()).collect();

    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Streak ending on the current UTC day.
pub fn current_streak<I>(completions: I) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    streak_as_of(Utc::now().date_naive(), completions)
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// The header-bar aggregates: XP, mastered nodes, lectures touched, streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Sum of all segment scores.
    pub total_xp: u32,
    /// Segments with score at or above the mastery threshold.
    pub completed_nodes: usize,
    /// Distinct lectures with any quiz activity.
    pub lectures_touched: usize,
    /// Consecutive-day completion streak ending today.
    pub streak_days: u32,
}

impl ProgressSummary {
    pub fn compute(
        progress: &[ProgressRecord],
        quiz_progress: &[QuizProgressRecord],
        today: NaiveDate,
    ) -> Self {
        let total_xp = progress.iter().map(|p| p.score.unwrap_or(0)).sum();
        let completed_nodes = progress
            .iter()
            .filter(|p| p.score.unwrap_or(0) >= MASTERY_THRESHOLD)
            .count();
        let lectures_touched = quiz_progress
            .iter()
            .filter_map(|q| q.lecture_id)
            .collect::<HashSet<_>>()
            .len();
        let streak_days = streak_as_of(today, progress.iter().filter_map(|p| p.completed_at));

        Self {
            total_xp,
            completed_nodes,
            lectures_touched,
            streak_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, NodeKind};
    use chrono::TimeZone;

    fn node(id: &str, prereqs: &[&str]) -> LessonNode {
        LessonNode {
            id: id.into(),
            title: id.into(),
            kind: NodeKind::Concept,
            difficulty: Difficulty::Beginner,
            prerequisites: prereqs.iter().map(|p| p.to_string()).collect(),
            points: 10,
            description: String::new(),
        }
    }

    fn scores(entries: &[(&str, u32)]) -> ScoreMap {
        let mut map = ScoreMap::new();
        for (id, score) in entries {
            map.record(id.to_string(), *score);
        }
        map
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn completed_iff_threshold_reached() {
        let n = node("seg_0", &[]);
        assert_eq!(status(&n, &scores(&[("seg_0", 10)])), NodeStatus::Completed);
        assert_eq!(status(&n, &scores(&[("seg_0", 15)])), NodeStatus::Completed);
        assert_ne!(status(&n, &scores(&[("seg_0", 9)])), NodeStatus::Completed);
    }

    #[test]
    fn root_node_always_available() {
        let n = node("seg_0", &[]);
        assert_eq!(status(&n, &ScoreMap::new()), NodeStatus::Available);
    }

    #[test]
    fn unlocks_when_prerequisite_mastered() {
        let n = node("seg_1", &["seg_0"]);
        assert_eq!(status(&n, &scores(&[("seg_0", 10)])), NodeStatus::Available);
    }

    #[test]
    fn locked_until_every_prerequisite_mastered() {
        let n = node("final", &["a", "b"]);
        assert_eq!(
            status(&n, &scores(&[("a", 10), ("b", 5)])),
            NodeStatus::Locked
        );
        assert_eq!(
            status(&n, &scores(&[("a", 10), ("b", 10)])),
            NodeStatus::Available
        );
    }

    #[test]
    fn missing_scores_read_as_zero() {
        let n = node("seg_1", &["seg_0"]);
        assert_eq!(status(&n, &ScoreMap::new()), NodeStatus::Locked);
        assert_eq!(ScoreMap::new().score("anything"), 0);
    }

    #[test]
    fn own_score_beats_locked_prerequisites() {
        // A node whose own score reached the threshold is completed even if
        // a prerequisite never was (scores can arrive in any order).
        let n = node("seg_1", &["seg_0"]);
        assert_eq!(status(&n, &scores(&[("seg_1", 10)])), NodeStatus::Completed);
    }

    #[test]
    fn last_write_wins_merge() {
        let mut map = ScoreMap::new();
        map.apply(&ScoreEvent {
            lecture_id: 1,
            segment_number: 2,
            score: 5,
        });
        map.apply(&ScoreEvent {
            lecture_id: 1,
            segment_number: 2,
            score: 10,
        });
        map.apply(&ScoreEvent {
            lecture_id: 1,
            segment_number: 2,
            score: 0,
        });
        assert_eq!(map.score("segment_2"), 0);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn evaluate_whole_pathway() {
        let pathway = Pathway::new(vec![
            node("segment_1", &[]),
            node("segment_2", &["segment_1"]),
            node("segment_3", &["segment_2"]),
        ])
        .unwrap();
        let states = evaluate(&pathway, &scores(&[("segment_1", 10), ("segment_2", 5)]));
        assert_eq!(states[0].status, NodeStatus::Completed);
        assert_eq!(states[1].status, NodeStatus::Available);
        assert_eq!(states[1].score, 5);
        assert_eq!(states[2].status, NodeStatus::Locked);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let completions = vec![day(2024, 3, 10), day(2024, 3, 9), day(2024, 3, 8)];
        assert_eq!(streak_as_of(today, completions), 3);
    }

    #[test]
    fn streak_zero_on_gap() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(streak_as_of(today, vec![day(2024, 3, 8)]), 0);
    }

    #[test]
    fn streak_empty_input() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(streak_as_of(today, Vec::new()), 0);
    }

    #[test]
    fn streak_stops_at_first_missing_day() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        // 10th and 9th present, 8th missing, 7th present.
        let completions = vec![day(2024, 3, 10), day(2024, 3, 9), day(2024, 3, 7)];
        assert_eq!(streak_as_of(today, completions), 2);
    }

    #[test]
    fn streak_dedupes_same_day_completions() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let completions = vec![
            day(2024, 3, 10),
            Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap(),
        ];
        assert_eq!(streak_as_of(today, completions), 1);
    }

    #[test]
    fn summary_aggregates() {
        let progress = vec![
            ProgressRecord {
                id: None,
                user_id: None,
                lecture_id: Some(1),
                segment_number: 1,
                score: Some(10),
                completed_at: Some(day(2024, 3, 10)),
            },
            ProgressRecord {
                id: None,
                user_id: None,
                lecture_id: Some(1),
                segment_number: 2,
                score: Some(5),
                completed_at: None,
            },
        ];
        let quiz_progress = vec![
            QuizProgressRecord {
                id: None,
                user_id: None,
                lecture_id: Some(1),
                segment_number: 1,
                quiz_number: 1,
                quiz_score: Some(5),
                completed_at: None,
            },
            QuizProgressRecord {
                id: None,
                user_id: None,
                lecture_id: Some(2),
                segment_number: 1,
                quiz_number: 1,
                quiz_score: Some(5),
                completed_at: None,
            },
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let summary = ProgressSummary::compute(&progress, &quiz_progress, today);
        assert_eq!(summary.total_xp, 15);
        assert_eq!(summary.completed_nodes, 1);
        assert_eq!(summary.lectures_touched, 2);
        assert_eq!(summary.streak_days, 1);
    }
}
