//! Local cache for transient quiz configuration.
//!
//! The quiz configuration view and the quiz-taking view are separate; the
//! chosen configuration travels between them through this file-backed
//! key-value cache, keyed by lecture identifier.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use studypath_core::model::QuizConfig;

const CACHE_FILE: &str = "quiz-config.json";

/// File-backed quiz-config store, keyed by lecture id.
#[derive(Debug)]
pub struct QuizConfigCache {
    path: PathBuf,
    entries: HashMap<i64, QuizConfig>,
}

impl QuizConfigCache {
    /// Open the cache in a directory, loading any existing entries.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(CACHE_FILE);
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read cache: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse cache: {}", path.display()))?
        } else {
            HashMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Store the config for a lecture and persist.
    pub fn store(&mut self, lecture_id: i64, config: QuizConfig) -> Result<()> {
        self.entries.insert(lecture_id, config);
        self.persist()
    }

    /// Look up the config for a lecture.
    pub fn get(&self, lecture_id: i64) -> Option<&QuizConfig> {
        self.entries.get(&lecture_id)
    }

    /// Remove and return the config for a lecture, persisting the removal.
    pub fn take(&mut self, lecture_id: i64) -> Result<Option<QuizConfig>> {
        let config = self.entries.remove(&lecture_id);
        if config.is_some() {
            self.persist()?;
        }
        Ok(config)
    }

    /// Drop every entry.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .context("failed to serialize quiz-config cache")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write cache: {}", self.path.display()))?;
        Ok(())
    }
}
