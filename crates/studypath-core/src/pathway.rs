//! Learning pathway graph: construction and validation.
//!
//! A pathway is an immutable set of lesson nodes with prerequisite edges.
//! The graph is validated when it is built: duplicate identifiers, unknown
//! prerequisite references, and cycles are load-time errors, never deferred
//! to evaluation time.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::model::{segment_node_id, Difficulty, LectureSegment, LessonNode, NodeKind};

/// Errors raised when a pathway graph fails validation.
#[derive(Debug, Error)]
pub enum PathwayError {
    #[error("duplicate node identifier: {0}")]
    DuplicateNode(String),

    #[error("node '{node}' references unknown prerequisite '{prerequisite}'")]
    UnknownPrerequisite { node: String, prerequisite: String },

    #[error("prerequisite cycle involving node '{0}'")]
    Cycle(String),
}

/// A validated learning pathway.
#[derive(Debug, Clone)]
pub struct Pathway {
    nodes: Vec<LessonNode>,
    index: HashMap<String, usize>,
}

impl Pathway {
    /// Build a pathway from nodes, validating the prerequisite graph.
    pub fn new(nodes: Vec<LessonNode>) -> Result<Self, PathwayError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(PathwayError::DuplicateNode(node.id.clone()));
            }
        }

        for node in &nodes {
            for prereq in &node.prerequisites {
                if !index.contains_key(prereq) {
                    return Err(PathwayError::UnknownPrerequisite {
                        node: node.id.clone(),
                        prerequisite: prereq.clone(),
                    });
                }
            }
        }

        detect_cycles(&nodes, &index)?;

        Ok(Self { nodes, index })
    }

    /// Derive the implicit sequence-order pathway from lecture segments.
    ///
    /// Each segment becomes one node chained to the previous segment:
    /// the first node has no prerequisites, every later node requires the
    /// one before it. Kind and difficulty follow the segment's position.
    pub fn from_segments(segments: &[LectureSegment]) -> Result<Self, PathwayError> {
        let mut ordered: Vec<&LectureSegment> = segments.iter().collect();
        ordered.sort_by_key(|s| s.sequence_number);

        let nodes = ordered
            .iter()
            .enumerate()
            .map(|(i, segment)| LessonNode {
                id: segment_node_id(segment.sequence_number),
                title: segment.title.clone(),
                kind: if i % 3 == 0 {
                    NodeKind::Quiz
                } else {
                    NodeKind::Concept
                },
                difficulty: if i < 3 {
                    Difficulty::Beginner
                } else if i < 7 {
                    Difficulty::Intermediate
                } else {
                    Difficulty::Advanced
                },
                prerequisites: if i == 0 {
                    Vec::new()
                } else {
                    vec![segment_node_id(ordered[i - 1].sequence_number)]
                },
                points: (i as u32 + 1) * 10,
                description: if segment.description.is_empty() {
                    format!("Master the concepts of {}", segment.title)
                } else {
                    segment.description.clone()
                },
            })
            .collect();

        Self::new(nodes)
    }

    pub fn nodes(&self) -> &[LessonNode] {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&LessonNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Depth-first cycle detection over the prerequisite edges.
fn detect_cycles(nodes: &[LessonNode], index: &HashMap<String, usize>) -> Result<(), PathwayError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];

    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // Iterative DFS; each stack entry is (node, next prerequisite edge).
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::InProgress;

        while let Some(top) = stack.last_mut() {
            let (node, edge) = *top;
            if edge >= nodes[node].prerequisites.len() {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            }
            top.1 += 1;
            let prereq = &nodes[node].prerequisites[edge];
            let target = index[prereq];
            match marks[target] {
                Mark::InProgress => {
                    return Err(PathwayError::Cycle(nodes[target].id.clone()));
                }
                Mark::Unvisited => {
                    marks[target] = Mark::InProgress;
                    stack.push((target, 0));
                }
                Mark::Done => {}
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TOML pathway files
// ---------------------------------------------------------------------------

/// Intermediate TOML structure for pathway definition files.
#[derive(Debug, Deserialize)]
struct TomlPathwayFile {
    pathway: TomlPathwayHeader,
    #[serde(default)]
    nodes: Vec<TomlNode>,
}

#[derive(Debug, Deserialize)]
struct TomlPathwayHeader {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlNode {
    id: String,
    title: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default = "default_points")]
    points: u32,
    #[serde(default)]
    description: String,
}

fn default_kind() -> String {
    "concept".to_string()
}

fn default_difficulty() -> String {
    "beginner".to_string()
}

fn default_points() -> u32 {
    10
}

/// A named pathway loaded from a definition file.
#[derive(Debug, Clone)]
pub struct PathwayFile {
    pub id: String,
    pub name: String,
    pub pathway: Pathway,
}

/// Parse a pathway definition TOML file.
pub fn load_pathway_file(path: &Path) -> Result<PathwayFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pathway file: {}", path.display()))?;
    parse_pathway_str(&content, path)
}

/// Parse a pathway definition from a TOML string (useful for testing).
pub fn parse_pathway_str(content: &str, source_path: &Path) -> Result<PathwayFile> {
    let parsed: TomlPathwayFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let nodes = parsed
        .nodes
        .into_iter()
        .map(|n| {
            Ok(LessonNode {
                id: n.id,
                title: n.title,
                kind: n.kind.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                difficulty: n
                    .difficulty
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!(e))?,
                prerequisites: n.prerequisites,
                points: n.points,
                description: n.description,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let pathway = Pathway::new(nodes)
        .with_context(|| format!("invalid pathway: {}", source_path.display()))?;
    Ok(PathwayFile {
        id: parsed.pathway.id,
        name: parsed.pathway.name,
        pathway,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

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

    fn segment(seq: u32, title: &str) -> LectureSegment {
        LectureSegment {
            id: None,
            lecture_id: Some(1),
            sequence_number: seq,
            title: title.into(),
            description: String::new(),
        }
    }

    #[test]
    fn valid_chain() {
        let pathway = Pathway::new(vec![
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["b"]),
        ])
        .unwrap();
        assert_eq!(pathway.len(), 3);
        assert_eq!(pathway.get("b").unwrap().prerequisites, vec!["a"]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = Pathway::new(vec![node("a", &[]), node("a", &[])]).unwrap_err();
        assert!(matches!(err, PathwayError::DuplicateNode(id) if id == "a"));
    }

    #[test]
    fn unknown_prerequisite_rejected() {
        let err = Pathway::new(vec![node("a", &["ghost"])]).unwrap_err();
        assert!(matches!(
            err,
            PathwayError::UnknownPrerequisite { prerequisite, .. } if prerequisite == "ghost"
        ));
    }

    #[test]
    fn cycle_rejected() {
        let err = Pathway::new(vec![
            node("a", &["c"]),
            node("b", &["a"]),
            node("c", &["b"]),
        ])
        .unwrap_err();
        assert!(matches!(err, PathwayError::Cycle(_)));
    }

    #[test]
    fn self_cycle_rejected() {
        let err = Pathway::new(vec![node("a", &["a"])]).unwrap_err();
        assert!(matches!(err, PathwayError::Cycle(id) if id == "a"));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        // a -> b, a -> c, b+c -> d: shared prerequisites are fine.
        let pathway = Pathway::new(vec![
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["a"]),
            node("d", &["b", "c"]),
        ]);
        assert!(pathway.is_ok());
    }

    #[test]
    fn from_segments_chains_in_sequence_order() {
        // Deliberately out of order; the chain must follow sequence numbers.
        let segments = vec![segment(2, "Borrowing"), segment(1, "Ownership")];
        let pathway = Pathway::from_segments(&segments).unwrap();

        let first = pathway.get("segment_1").unwrap();
        assert!(first.prerequisites.is_empty());
        assert_eq!(first.points, 10);

        let second = pathway.get("segment_2").unwrap();
        assert_eq!(second.prerequisites, vec!["segment_1"]);
        assert_eq!(second.points, 20);
    }

    #[test]
    fn from_segments_tiers_difficulty_by_position() {
        let segments: Vec<_> = (1..=9).map(|i| segment(i, "s")).collect();
        let pathway = Pathway::from_segments(&segments).unwrap();
        assert_eq!(
            pathway.get("segment_1").unwrap().difficulty,
            Difficulty::Beginner
        );
        assert_eq!(
            pathway.get("segment_4").unwrap().difficulty,
            Difficulty::Intermediate
        );
        assert_eq!(
            pathway.get("segment_9").unwrap().difficulty,
            Difficulty::Advanced
        );
        // Every third node (positions 0, 3, 6, ...) is a quiz node.
        assert_eq!(pathway.get("segment_1").unwrap().kind, NodeKind::Quiz);
        assert_eq!(pathway.get("segment_2").unwrap().kind, NodeKind::Concept);
        assert_eq!(pathway.get("segment_4").unwrap().kind, NodeKind::Quiz);
    }

    const VALID_TOML: &str = r#"
[pathway]
id = "rust-intro"
name = "Introduction to Rust"

[[nodes]]
id = "segment_1"
title = "Ownership"
kind = "concept"
difficulty = "beginner"
points = 10

[[nodes]]
id = "segment_2"
title = "Borrowing"
kind = "quiz"
difficulty = "beginner"
prerequisites = ["segment_1"]
points = 20
"#;

    #[test]
    fn parse_valid_toml() {
        let file = parse_pathway_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(file.id, "rust-intro");
        assert_eq!(file.name, "Introduction to Rust");
        assert_eq!(file.pathway.len(), 2);
        assert_eq!(file.pathway.get("segment_2").unwrap().kind, NodeKind::Quiz);
    }

    #[test]
    fn parse_defaults_for_optional_fields() {
        let toml = r#"
[pathway]
id = "minimal"
name = "Minimal"

[[nodes]]
id = "only"
title = "Only node"
"#;
        let file = parse_pathway_str(toml, &PathBuf::from("test.toml")).unwrap();
        let node = file.pathway.get("only").unwrap();
        assert_eq!(node.kind, NodeKind::Concept);
        assert_eq!(node.difficulty, Difficulty::Beginner);
        assert_eq!(node.points, 10);
    }

    #[test]
    fn parse_cyclic_toml_fails() {
        let toml = r#"
[pathway]
id = "cyclic"
name = "Cyclic"

[[nodes]]
id = "a"
title = "A"
prerequisites = ["b"]

[[nodes]]
id = "b"
title = "B"
prerequisites = ["a"]
"#;
        let result = parse_pathway_str(toml, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let result = parse_pathway_str("not [valid toml }{", &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("pathway.toml");
        std::fs::write(&file_path, VALID_TOML).unwrap();

        let file = load_pathway_file(&file_path).unwrap();
        assert_eq!(file.pathway.len(), 2);
    }

    #[test]
    fn load_missing_file_fails() {
        let result = load_pathway_file(&PathBuf::from("/nonexistent/pathway.toml"));
        assert!(result.is_err());
    }
}
