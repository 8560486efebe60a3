// src/lib.rs

//! issue-harvest: resumable Jira issue scraper library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
