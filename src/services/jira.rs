// src/services/jira.rs

//! Jira REST client.
//!
//! Every request passes through the shared [`AdmissionGate`]; failures are
//! classified into [`FetchError`] kinds before they leave this module.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{FetchError, Result};
use crate::models::{Config, Page, RawIssue, SearchResponse};
use crate::utils::http::{AdmissionGate, create_async_client, parse_retry_after};

const SEARCH_PATH: &str = "rest/api/2/search";
const ISSUE_PATH: &str = "rest/api/2/issue/";

/// Longest slice of an error body kept in a [`FetchError::RequestFailed`].
const ERROR_BODY_LIMIT: usize = 200;

/// Source of issue pages for the fetch loop.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch one page of results for `jql` starting at `start_at`.
    async fn search_issues(
        &self,
        jql: &str,
        start_at: u64,
        max_results: u64,
    ) -> std::result::Result<Page, FetchError>;
}

/// Client for a single Jira instance.
pub struct JiraClient {
    http: Client,
    search_url: Url,
    issue_url: Url,
    expand: String,
    gate: AdmissionGate,
}

impl JiraClient {
    /// Build a client from configuration with its own admission gate.
    pub fn new(config: &Config) -> Result<Self> {
        let http = create_async_client(&config.client)?;
        let gate = AdmissionGate::new(config.client.max_concurrent);
        Self::with_parts(
            http,
            config.client.base_url()?,
            &config.scrape.expand,
            gate,
        )
    }

    pub fn with_parts(
        http: Client,
        base_url: Url,
        expand: &str,
        gate: AdmissionGate,
    ) -> Result<Self> {
        Ok(Self {
            http,
            search_url: base_url.join(SEARCH_PATH)?,
            issue_url: base_url.join(ISSUE_PATH)?,
            expand: expand.to_string(),
            gate,
        })
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Fetch a single issue by key.
    pub async fn fetch_issue(&self, issue_key: &str) -> std::result::Result<RawIssue, FetchError> {
        let url = self
            .issue_url
            .join(issue_key)
            .map_err(|e| FetchError::InvalidRequest(format!("issue key {issue_key:?}: {e}")))?;
        let params = [("expand", self.expand.clone())];
        self.get_json(url, &params).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> std::result::Result<T, FetchError> {
        self.gate.run(self.send(url, params)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> std::result::Result<T, FetchError> {
        let response = self.http.get(url).query(params).send().await?;
        let status = response.status();

        match classify_status(status, response.headers()) {
            None => {}
            Some(FetchError::RequestFailed { status, message }) => {
                let body = response.text().await.unwrap_or_default();
                let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
                let message = if body.trim().is_empty() {
                    message
                } else {
                    format!("{message}: {}", body.trim())
                };
                return Err(FetchError::RequestFailed { status, message });
            }
            Some(err) => return Err(err),
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn search_issues(
        &self,
        jql: &str,
        start_at: u64,
        max_results: u64,
    ) -> std::result::Result<Page, FetchError> {
        let params = [
            ("jql", jql.to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
            ("expand", self.expand.clone()),
        ];
        let response: SearchResponse = self.get_json(self.search_url.clone(), &params).await?;
        log::debug!(
            "search {:?} startAt={} returned {} of {}",
            jql,
            start_at,
            response.issues.len(),
            response.total
        );
        Ok(Page::from_response(response, start_at, max_results))
    }
}

/// Map a response status to a failure, or `None` for success.
pub fn classify_status(status: StatusCode, headers: &HeaderMap) -> Option<FetchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some(FetchError::RateLimited {
            retry_after: parse_retry_after(headers),
        });
    }
    if status.is_success() {
        return None;
    }
    Some(FetchError::RequestFailed {
        status: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string(),
    })
}

/// Query selecting every issue of `project` in stable creation order.
pub fn project_jql(project: &str) -> String {
    format!("project = {project} ORDER BY created ASC")
}
