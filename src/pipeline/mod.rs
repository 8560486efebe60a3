//! Pipeline entry points for harvester operations.
//!
//! - `retry`: bounded exponential backoff around one fetch
//! - `fetch`: pagination loop for a single project
//! - `run`: fans the loop out over all requested projects

pub mod fetch;
pub mod retry;
pub mod run;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{ProjectFetcher, ProjectOutcome, ProjectState};
pub use retry::RetryPolicy;
pub use run::{RunSummary, prepare_projects, run_harvest, run_projects};
