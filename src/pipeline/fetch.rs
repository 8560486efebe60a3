// src/pipeline/fetch.rs

//! Per-project pagination loop.
//!
//! ```text
//! Resuming ──completed──────────────────────────────▶ Completed
//!    │
//!    ▼
//! Fetching ──empty page──────────────────────────────▶ Completed
//!    │  └──retries exhausted─────────────────────────▶ Failed
//!    ▼
//! Appending ──▶ Advancing ──offset >= total──────────▶ Completed
//!                  └──────────▶ Fetching
//! ```
//!
//! Records of a page are flushed to the output file before the checkpoint
//! for that page is persisted, so an interruption can only cause the last
//! page to be fetched again, never skipped.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{ProjectCheckpoint, Record};
use crate::pipeline::RetryPolicy;
use crate::services::{IssueSource, Normalizer, project_jql};
use crate::storage::{CheckpointStore, RecordWriter};

/// States of one project's fetch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectState {
    Resuming,
    Fetching,
    Appending,
    Advancing,
    Completed,
    Failed,
}

/// Where a project's loop ended up.
#[derive(Debug, Clone)]
pub struct ProjectOutcome {
    pub project: String,
    pub state: ProjectState,
    /// Offset the loop started from
    pub resumed_at: u64,
    pub pages_fetched: u64,
    pub records_written: u64,
    pub error: Option<String>,
}

impl ProjectOutcome {
    fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            state: ProjectState::Resuming,
            resumed_at: 0,
            pages_fetched: 0,
            records_written: 0,
            error: None,
        }
    }

    fn transition(&mut self, next: ProjectState) {
        log::trace!("{}: {:?} -> {:?}", self.project, self.state, next);
        self.state = next;
    }

    pub fn is_completed(&self) -> bool {
        self.state == ProjectState::Completed
    }
}

/// Shared collaborators of every project loop in a run.
pub struct ProjectFetcher<'a> {
    source: &'a dyn IssueSource,
    store: &'a CheckpointStore,
    policy: &'a RetryPolicy,
    normalizer: &'a Normalizer,
    output_dir: PathBuf,
    page_size: u64,
}

impl<'a> ProjectFetcher<'a> {
    pub fn new(
        source: &'a dyn IssueSource,
        store: &'a CheckpointStore,
        policy: &'a RetryPolicy,
        normalizer: &'a Normalizer,
        output_dir: impl Into<PathBuf>,
        page_size: u64,
    ) -> Self {
        Self {
            source,
            store,
            policy,
            normalizer,
            output_dir: output_dir.into(),
            page_size: page_size.max(1),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn store(&self) -> &CheckpointStore {
        self.store
    }

    /// Drive `project` to a terminal state. Failures are captured in the
    /// outcome rather than returned.
    pub async fn run(&self, project: &str) -> ProjectOutcome {
        let mut outcome = ProjectOutcome::new(project);
        if let Err(e) = self.drive(project, &mut outcome).await {
            log::error!("{}: failed at {:?}: {}", project, outcome.state, e);
            outcome.transition(ProjectState::Failed);
            outcome.error = Some(e.to_string());
        }
        outcome
    }

    async fn drive(&self, project: &str, outcome: &mut ProjectOutcome) -> Result<()> {
        let resume = self.store.get(project).await;
        outcome.resumed_at = resume.last_start_at;
        if resume.completed {
            log::info!("{}: already completed, skipping", project);
            outcome.transition(ProjectState::Completed);
            return Ok(());
        }
        log::info!("{}: resuming at offset {}", project, resume.last_start_at);

        // Dropped on every exit path, closing the file.
        let mut writer = RecordWriter::open(&self.output_dir, project).await?;
        log::debug!("{}: appending to {}", project, writer.path().display());
        let jql = project_jql(project);
        let mut start_at = resume.last_start_at;

        loop {
            outcome.transition(ProjectState::Fetching);
            let page = self
                .policy
                .run(format!("{project} startAt={start_at}"), || {
                    self.source.search_issues(&jql, start_at, self.page_size)
                })
                .await?;
            outcome.pages_fetched += 1;

            if page.is_empty() {
                if start_at < page.total {
                    log::warn!(
                        "{}: empty page at offset {} below reported total {}",
                        project,
                        start_at,
                        page.total
                    );
                }
                self.persist(project, start_at, true).await?;
                log::info!("{}: completed at offset {}", project, start_at);
                outcome.transition(ProjectState::Completed);
                return Ok(());
            }

            outcome.transition(ProjectState::Appending);
            let records: Vec<Record> = page
                .issues
                .iter()
                .map(|issue| self.normalizer.normalize(issue))
                .collect();
            outcome.records_written += writer.append(&records).await? as u64;

            outcome.transition(ProjectState::Advancing);
            start_at += self.page_size;
            let completed = start_at >= page.total;
            self.persist(project, start_at, completed).await?;
            log::info!(
                "{}: wrote {} issue(s), next offset {} of {}",
                project,
                records.len(),
                start_at,
                page.total
            );

            if completed {
                log::info!("{}: completed", project);
                outcome.transition(ProjectState::Completed);
                return Ok(());
            }
        }
    }

    async fn persist(&self, project: &str, start_at: u64, completed: bool) -> Result<()> {
        self.store
            .update(
                project,
                ProjectCheckpoint {
                    last_start_at: start_at,
                    completed,
                },
            )
            .await
    }
}
