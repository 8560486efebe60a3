//! Durable state for the harvester.
//!
//! ## Layout
//!
//! ```text
//! checkpoint.json           # project -> {last_startAt, completed}
//! output/
//! ├── HADOOP.jsonl          # one normalized record per line, append-only
//! └── KAFKA.jsonl
//! ```

pub mod checkpoint;
pub mod jsonl;

// Re-export for convenience
pub use checkpoint::{CheckpointStore, load_checkpoint, save_checkpoint};
pub use jsonl::{RecordWriter, output_path};
