// src/pipeline/run.rs

//! Run orchestration across projects.

use std::collections::HashSet;

use futures::future::join_all;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::{ProjectFetcher, ProjectOutcome, RetryPolicy};
use crate::services::{JiraClient, Normalizer};
use crate::storage::CheckpointStore;
use crate::utils::is_valid_project_key;

/// Result of one run over all requested projects.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ProjectOutcome>,
}

impl RunSummary {
    /// True iff every project reached `Completed`.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ProjectOutcome::is_completed)
    }

    pub fn failed_projects(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_completed())
            .map(|o| o.project.clone())
            .collect()
    }

    pub fn records_written(&self) -> u64 {
        self.outcomes.iter().map(|o| o.records_written).sum()
    }

    /// Turn a partial run into [`AppError::RunFailed`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AppError::RunFailed {
                failed: self.failed_projects(),
            })
        }
    }
}

/// Check project keys and drop repeats, keeping first-seen order.
pub fn prepare_projects(projects: &[String]) -> Result<Vec<String>> {
    if projects.is_empty() {
        return Err(AppError::validation("at least one project key is required"));
    }
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for project in projects {
        if !is_valid_project_key(project) {
            return Err(AppError::validation(format!(
                "invalid project key {project:?}"
            )));
        }
        if seen.insert(project.as_str()) {
            unique.push(project.clone());
        } else {
            log::warn!("Project {} listed more than once, fetching it once", project);
        }
    }
    Ok(unique)
}

/// Scrape `projects` against the Jira instance described by `config`.
pub async fn run_harvest(config: &Config, projects: &[String]) -> Result<RunSummary> {
    config.validate()?;
    let projects = prepare_projects(projects)?;

    let store = CheckpointStore::open(&config.scrape.checkpoint_file).await;
    let client = JiraClient::new(config)?;
    let normalizer = Normalizer::new(&config.client.base_url()?);
    let policy = RetryPolicy::from_config(&config.retry);

    log::info!(
        "Harvesting {} project(s) from {} (page size {}, concurrency {})",
        projects.len(),
        config.client.base_url,
        config.scrape.page_size,
        client.gate().limit()
    );

    let fetcher = ProjectFetcher::new(
        &client,
        &store,
        &policy,
        &normalizer,
        &config.scrape.output_dir,
        config.scrape.page_size,
    );
    run_projects(&fetcher, &projects).await
}

/// Run one loop per project concurrently and wait for all of them.
pub async fn run_projects(fetcher: &ProjectFetcher<'_>, projects: &[String]) -> Result<RunSummary> {
    log::info!(
        "Writing to {}, checkpoint at {}",
        fetcher.output_dir().display(),
        fetcher.store().path().display()
    );
    let outcomes = join_all(projects.iter().map(|project| fetcher.run(project))).await;
    fetcher.store().flush().await?;

    let summary = RunSummary { outcomes };
    for outcome in &summary.outcomes {
        log::info!(
            "    {}: {:?}, {} page(s), {} record(s){}",
            outcome.project,
            outcome.state,
            outcome.pages_fetched,
            outcome.records_written,
            outcome
                .error
                .as_deref()
                .map(|e| format!(" ({e})"))
                .unwrap_or_default()
        );
    }
    log::info!(
        "Run finished: {}/{} project(s) completed, {} record(s) written",
        summary.outcomes.len() - summary.failed_projects().len(),
        summary.outcomes.len(),
        summary.records_written()
    );
    Ok(summary)
}
