//! Per-project resume state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resume point for one project.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectCheckpoint {
    /// Offset of the next page to fetch
    #[serde(rename = "last_startAt", default)]
    pub last_start_at: u64,

    /// No further pages are fetched once set
    #[serde(default)]
    pub completed: bool,
}

/// Project key to resume point. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Checkpoint {
    entries: BTreeMap<String, ProjectCheckpoint>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `project`, or the zero state if never seen.
    pub fn get(&self, project: &str) -> ProjectCheckpoint {
        self.entries.get(project).copied().unwrap_or_default()
    }

    pub fn set(&mut self, project: &str, entry: ProjectCheckpoint) {
        self.entries.insert(project.to_string(), entry);
    }

    pub fn remove(&mut self, project: &str) -> Option<ProjectCheckpoint> {
        self.entries.remove(project)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProjectCheckpoint)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
