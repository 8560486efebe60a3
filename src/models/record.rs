//! Normalized issue record, one per output line.

use serde::{Deserialize, Serialize};

/// Flat representation of one issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Issue key, e.g. `HADOOP-1234`
    pub id: Option<String>,

    /// Key prefix before the first `-`
    pub project: Option<String>,

    pub title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub labels: Vec<String>,

    /// RFC 3339 when parseable, otherwise the upstream string
    pub created_at: Option<String>,
    pub updated_at: Option<String>,

    /// Plain-text description
    pub description: String,

    pub comments: Vec<CommentRecord>,

    /// Canonical browse URL
    pub url: String,

    pub derived: Derived,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentRecord {
    pub author: Option<String>,
    pub created: Option<String>,
    pub body: String,
}

/// Fields computed from the record itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Derived {
    pub summary: String,
    pub classification_labels: Vec<String>,
    pub qna_pairs: Vec<QnaPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QnaPair {
    pub question: String,
    pub answer: String,
}
