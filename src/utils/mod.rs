//! Utility functions and helpers.

pub mod http;

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat};
use regex::Regex;
use scraper::Html;
use unicode_segmentation::UnicodeSegmentation;

/// Jira's own timestamp layout, e.g. `2019-03-04T10:11:12.000+0000`.
const JIRA_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Strip tags from an HTML fragment, keeping one line per text node.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize a timestamp to RFC 3339, passing unparseable input through.
pub fn normalize_timestamp(raw: &str) -> String {
    DateTime::parse_from_str(raw, JIRA_TIMESTAMP)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        .unwrap_or_else(|_| raw.to_string())
}

/// Keep at most `max` grapheme clusters.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    text.graphemes(true).take(max).collect()
}

/// Project key of an issue key (`HADOOP-12` -> `HADOOP`).
pub fn project_prefix(issue_key: &str) -> &str {
    issue_key.split('-').next().unwrap_or(issue_key)
}

/// Whether `key` looks like a Jira project key.
pub fn is_valid_project_key(key: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_keeps_line_breaks() {
        assert_eq!(html_to_text("<p>Hello<br/>World</p>"), "Hello\nWorld");
    }

    #[test]
    fn test_html_to_text_plain_and_empty() {
        assert_eq!(html_to_text("  just text "), "just text");
        assert_eq!(html_to_text(""), "");
        assert_eq!(
            html_to_text("<p>a &amp; b</p>\n<ul><li>one</li><li>two</li></ul>"),
            "a & b\none\ntwo"
        );
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(
            normalize_timestamp("2019-03-04T10:11:12.000+0000"),
            "2019-03-04T10:11:12+00:00"
        );
        assert_eq!(
            normalize_timestamp("2019-03-04T10:11:12.250-0700"),
            "2019-03-04T10:11:12.250-07:00"
        );
        assert_eq!(
            normalize_timestamp("2020-01-01T00:00:00Z"),
            "2020-01-01T00:00:00+00:00"
        );
        assert_eq!(normalize_timestamp("last tuesday"), "last tuesday");
    }

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate_graphemes("héllo", 2), "hé");
        assert_eq!(truncate_graphemes("ab", 10), "ab");
    }

    #[test]
    fn test_project_prefix() {
        assert_eq!(project_prefix("HADOOP-12"), "HADOOP");
        assert_eq!(project_prefix("NOPREFIX"), "NOPREFIX");
    }

    #[test]
    fn test_is_valid_project_key() {
        assert!(is_valid_project_key("HADOOP"));
        assert!(is_valid_project_key("A1_B"));
        assert!(!is_valid_project_key("hadoop"));
        assert!(!is_valid_project_key("A B"));
        assert!(!is_valid_project_key(""));
    }
}
