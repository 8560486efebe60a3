// src/services/normalize.rs

//! Raw issue to flat [`Record`] conversion.

use url::Url;

use crate::models::{CommentRecord, Derived, RawComment, RawIssue, Record};
use crate::utils::{html_to_text, normalize_timestamp, project_prefix, truncate_graphemes};

/// Longest derived summary, in grapheme clusters.
const SUMMARY_LIMIT: usize = 300;

/// Stateless converter from upstream payloads to records.
#[derive(Debug, Clone)]
pub struct Normalizer {
    browse_base: String,
}

impl Normalizer {
    /// `base_url` is the instance root; browse links are built beneath it.
    pub fn new(base_url: &Url) -> Self {
        let mut browse_base = base_url.as_str().to_string();
        if !browse_base.ends_with('/') {
            browse_base.push('/');
        }
        browse_base.push_str("browse/");
        Self { browse_base }
    }

    pub fn normalize(&self, raw: &RawIssue) -> Record {
        let fields = &raw.fields;
        let rendered = raw.rendered_fields.as_ref();
        let key = raw.key.clone();

        let description_html = rendered
            .and_then(|r| r.description.as_deref())
            .filter(|d| !d.is_empty())
            .or(fields.description.as_deref())
            .unwrap_or_default();
        let description = html_to_text(description_html);

        let comments: Vec<CommentRecord> = rendered
            .and_then(|r| r.comment.as_ref())
            .filter(|c| !c.comments.is_empty())
            .or(fields.comment.as_ref())
            .map(|page| page.comments.iter().map(convert_comment).collect())
            .unwrap_or_default();

        Record {
            project: key.as_deref().map(|k| project_prefix(k).to_string()),
            url: format!("{}{}", self.browse_base, key.as_deref().unwrap_or_default()),
            id: key,
            title: fields.summary.clone(),
            status: fields.status.as_ref().and_then(|s| s.name.clone()),
            priority: fields.priority.as_ref().and_then(|p| p.name.clone()),
            assignee: fields.assignee.as_ref().and_then(|u| u.display_name.clone()),
            reporter: fields.reporter.as_ref().and_then(|u| u.display_name.clone()),
            labels: fields.labels.clone().unwrap_or_default(),
            created_at: fields.created.as_deref().map(normalize_timestamp),
            updated_at: fields.updated.as_deref().map(normalize_timestamp),
            derived: derive(&description),
            description,
            comments,
        }
    }
}

fn convert_comment(comment: &RawComment) -> CommentRecord {
    let body = comment
        .body
        .as_deref()
        .filter(|b| !b.is_empty())
        .or(comment.rendered_body.as_deref())
        .unwrap_or_default();

    CommentRecord {
        author: comment.author.as_ref().and_then(|a| a.display_name.clone()),
        created: comment.created.as_deref().map(normalize_timestamp),
        body: html_to_text(body),
    }
}

/// First sentence of the first line, truncated.
fn derive(description: &str) -> Derived {
    let first_line = description.lines().next().unwrap_or_default();
    let first_sentence = first_line.split(". ").next().unwrap_or_default();
    Derived {
        summary: truncate_graphemes(first_sentence, SUMMARY_LIMIT),
        ..Derived::default()
    }
}
