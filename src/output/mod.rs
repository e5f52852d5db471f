//! Output module for the snapshot document and the run summary
//!
//! This module handles:
//! - Serializing the record list into the snapshot JSON document
//! - Counting what happened during a run and printing the summary

mod snapshot;
pub mod stats;

pub use snapshot::{write_snapshot, Snapshot};
pub use stats::{print_statistics, CrawlStats};

use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for output operations
pub type OutputResult<T> = std::result::Result<T, OutputError>;
