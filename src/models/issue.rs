//! Raw upstream payloads as returned by the Jira REST API.
//!
//! Every field is optional or defaulted: responses are taken as-is, never
//! validated against a schema.

use serde::{Deserialize, Serialize};

/// Body of `GET /rest/api/2/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

/// One issue as returned by search or issue-by-key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub fields: IssueFields,
    #[serde(default)]
    pub rendered_fields: Option<RenderedFields>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<NamedField>,
    #[serde(default)]
    pub priority: Option<NamedField>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default)]
    pub reporter: Option<UserRef>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<CommentPage>,
}

/// HTML renderings requested with `expand=renderedFields`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderedFields {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<CommentPage>,
}

/// Status, priority and similar `{ "name": ... }` objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedField {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub rendered_body: Option<String>,
}

/// A batch of issues from one fetch call plus the request that produced it.
#[derive(Debug, Clone)]
pub struct Page {
    pub issues: Vec<RawIssue>,
    /// Total matches reported upstream at fetch time
    pub total: u64,
    pub start_at: u64,
    pub page_size: u64,
}

impl Page {
    pub fn from_response(response: SearchResponse, start_at: u64, page_size: u64) -> Self {
        Self {
            issues: response.issues,
            total: response.total,
            start_at,
            page_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}
