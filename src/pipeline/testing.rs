//! In-memory issue source for pipeline tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;
use crate::models::{Page, RawIssue, Record};
use crate::services::{IssueSource, Normalizer};
use crate::utils::http::AdmissionGate;

/// Serves `<PROJECT>-1 ..= <PROJECT>-n` in order for each configured project.
#[derive(Default)]
pub struct FakeJira {
    sizes: HashMap<String, u64>,
    reported_totals: HashMap<String, u64>,
    failing_offsets: HashMap<String, u64>,
    /// Per project: offset, remaining 429 answers, advertised delay
    throttles: Mutex<HashMap<String, (u64, u32, Duration)>>,
    calls: Mutex<Vec<(String, u64)>>,
    gate: Option<AdmissionGate>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeJira {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: &str, issues: u64) -> Self {
        self.sizes.insert(project.to_string(), issues);
        self
    }

    /// Report `total` instead of the real issue count.
    pub fn with_reported_total(mut self, project: &str, total: u64) -> Self {
        self.reported_totals.insert(project.to_string(), total);
        self
    }

    /// Answer 401 whenever `project` is asked for `offset`.
    pub fn failing_at(mut self, project: &str, offset: u64) -> Self {
        self.failing_offsets.insert(project.to_string(), offset);
        self
    }

    /// Answer 429 with `Retry-After: retry_after` the first `times` requests
    /// for `offset`.
    pub fn rate_limited_at(
        self,
        project: &str,
        offset: u64,
        times: u32,
        retry_after: Duration,
    ) -> Self {
        self.throttles
            .lock()
            .unwrap()
            .insert(project.to_string(), (offset, times, retry_after));
        self
    }

    /// Route every request through `gate`, holding it for `latency`.
    pub fn gated(mut self, gate: AdmissionGate, latency: Duration) -> Self {
        self.gate = Some(gate);
        self.latency = latency;
        self
    }

    pub fn offsets(&self, project: &str) -> Vec<u64> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == project)
            .map(|(_, offset)| *offset)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn respond(
        &self,
        project: &str,
        start_at: u64,
        max_results: u64,
    ) -> Result<Page, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let throttled = {
            let mut throttles = self.throttles.lock().unwrap();
            match throttles.get_mut(project) {
                Some((offset, left, retry_after)) if *offset == start_at && *left > 0 => {
                    *left -= 1;
                    Some(*retry_after)
                }
                _ => None,
            }
        };
        if let Some(retry_after) = throttled {
            return Err(FetchError::RateLimited {
                retry_after: Some(retry_after),
            });
        }

        if self.failing_offsets.get(project) == Some(&start_at) {
            return Err(FetchError::RequestFailed {
                status: 401,
                message: "Unauthorized".into(),
            });
        }

        let size = self.sizes.get(project).copied().unwrap_or(0);
        let end = (start_at + max_results).min(size);
        let issues = (start_at..end)
            .map(|i| RawIssue {
                key: Some(format!("{project}-{}", i + 1)),
                ..RawIssue::default()
            })
            .collect();

        Ok(Page {
            issues,
            total: self.reported_totals.get(project).copied().unwrap_or(size),
            start_at,
            page_size: max_results,
        })
    }
}

#[async_trait]
impl IssueSource for FakeJira {
    async fn search_issues(
        &self,
        jql: &str,
        start_at: u64,
        max_results: u64,
    ) -> Result<Page, FetchError> {
        let project = jql.split_whitespace().nth(2).unwrap_or_default().to_string();
        self.calls.lock().unwrap().push((project.clone(), start_at));

        match &self.gate {
            Some(gate) => {
                gate.run(self.respond(&project, start_at, max_results))
                    .await
            }
            None => self.respond(&project, start_at, max_results).await,
        }
    }
}

pub fn test_normalizer() -> Normalizer {
    Normalizer::new(&Url::parse("https://jira.test/").unwrap())
}

/// Issue ids in an output file, in line order.
pub fn read_ids(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str::<Record>(line).unwrap().id.unwrap())
        .collect()
}
