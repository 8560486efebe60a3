//! Service layer for the harvester.
//!
//! - Jira REST access (`JiraClient`, `IssueSource`)
//! - Record normalization (`Normalizer`)

mod jira;
mod normalize;

pub use jira::{IssueSource, JiraClient, classify_status, project_jql};
pub use normalize::Normalizer;
