//! Snapshot document writer

use super::OutputResult;
use crate::state::PublicationRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// The document consumed by the website
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Local time of the run, ISO-8601 with microseconds and no offset
    pub last_updated: String,
    pub publications: Vec<PublicationRecord>,
}

impl Snapshot {
    /// Wraps `records` with the current local time
    pub fn new(records: Vec<PublicationRecord>) -> Self {
        Self {
            last_updated: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            publications: records,
        }
    }

    pub fn len(&self) -> usize {
        self.publications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }
}

/// Writes `snapshot` to `path` as pretty-printed JSON
///
/// The parent directory is created if needed and any existing file is
/// replaced.
///
/// # Arguments
///
/// * `snapshot` - The document to write
/// * `path` - Destination file
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;

    tracing::debug!(
        "Wrote {} publications to {}",
        snapshot.len(),
        path.display()
    );
    Ok(())
}
