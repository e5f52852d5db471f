//! Crawler module for listing extraction
//!
//! This module contains the core extraction logic, including:
//! - HTTP fetching with browser identification
//! - Listing row parsing and the author filter
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{build_http_client, download_to, get_text, PageFetcher};
pub use parser::{
    extract_pdf_link, is_prominent_author, ParsedRow, RejectReason, RowOutcome, RowParser,
};

use crate::config::Config;
use crate::SnapshotError;

/// Runs a complete extraction with the configured renderer
///
/// # Arguments
///
/// * `config` - A validated configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run finished; check `stop_reason` for how
/// * `Err(SnapshotError)` - The run could not be set up
pub async fn crawl(config: &Config) -> Result<CrawlReport, SnapshotError> {
    let mut coordinator = Coordinator::new(config)?;
    Ok(coordinator.run().await)
}
