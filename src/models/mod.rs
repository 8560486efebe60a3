// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod checkpoint;
mod config;
mod issue;
mod record;

// Re-export all public types
pub use checkpoint::{Checkpoint, ProjectCheckpoint};
pub use config::{ClientConfig, Config, RetryConfig, ScrapeConfig};
pub use issue::{
    CommentPage, IssueFields, NamedField, Page, RawComment, RawIssue, RenderedFields,
    SearchResponse, UserRef,
};
pub use record::{CommentRecord, Derived, QnaPair, Record};
