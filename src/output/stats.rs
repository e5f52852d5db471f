//! Run statistics
//!
//! Counters are collected by the coordinator while it crawls and printed
//! once at the end of the run.

use crate::crawler::RejectReason;
use crate::state::StopReason;
use crate::thumbnail::{Degradation, ResolvedThumbnail, ThumbnailSource};

/// Counters for a single extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Listing pages fetched successfully
    pub pages_fetched: usize,

    /// Rows seen across all fetched pages
    pub rows_seen: usize,

    pub rows_accepted: usize,

    /// Rows without any title locator
    pub rejected_no_title: usize,

    /// Rows dropped by the author filter
    pub rejected_author: usize,

    pub thumbnails_listing: usize,
    pub thumbnails_pdf: usize,
    pub thumbnails_default: usize,

    /// PDF links found on detail pages, rendered or not
    pub pdf_links_found: usize,

    pub image_download_failures: usize,
    pub detail_page_failures: usize,
    pub pdf_download_failures: usize,
    pub render_failures: usize,
    pub renderer_unavailable: usize,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a skipped row
    pub fn record_rejection(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::MissingTitle => self.rejected_no_title += 1,
            RejectReason::AuthorFilter => self.rejected_author += 1,
        }
    }

    /// Records the outcome of the thumbnail chain for one record
    pub fn record_thumbnail(&mut self, resolved: &ResolvedThumbnail) {
        match resolved.source {
            ThumbnailSource::Listing => self.thumbnails_listing += 1,
            ThumbnailSource::PdfCover => self.thumbnails_pdf += 1,
            ThumbnailSource::Default => self.thumbnails_default += 1,
        }
        if resolved.pdf_link.is_some() {
            self.pdf_links_found += 1;
        }
        for degradation in &resolved.degradations {
            match degradation {
                Degradation::ImageDownload => self.image_download_failures += 1,
                Degradation::DetailPage => self.detail_page_failures += 1,
                Degradation::PdfDownload => self.pdf_download_failures += 1,
                Degradation::Render => self.render_failures += 1,
                Degradation::RendererUnavailable => self.renderer_unavailable += 1,
            }
        }
    }

    /// Total rows skipped for any reason
    pub fn rows_rejected(&self) -> usize {
        self.rejected_no_title + self.rejected_author
    }

    /// Total failures absorbed by the thumbnail chain
    pub fn absorbed_failures(&self) -> usize {
        self.image_download_failures
            + self.detail_page_failures
            + self.pdf_download_failures
            + self.render_failures
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The counters to display
/// * `stop_reason` - Why the crawl ended
pub fn print_statistics(stats: &CrawlStats, stop_reason: &StopReason) {
    println!("=== Run Statistics ===\n");

    println!("Crawl:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Stopped: {} ({})", stop_reason.label(), stop_reason);
    println!();

    println!("Rows:");
    println!("  Seen: {}", stats.rows_seen);
    println!("  Accepted: {}", stats.rows_accepted);
    println!("  Skipped: {}", stats.rows_rejected());
    println!("  Skipped (no title): {}", stats.rejected_no_title);
    println!("  Skipped (author filter): {}", stats.rejected_author);
    println!();

    println!("Thumbnails:");
    println!("  PDF cover: {}", stats.thumbnails_pdf);
    println!("  Listing image: {}", stats.thumbnails_listing);
    println!("  Default: {}", stats.thumbnails_default);
    println!("  PDF links found: {}", stats.pdf_links_found);
    println!();

    if stats.absorbed_failures() > 0 || stats.renderer_unavailable > 0 {
        println!("Absorbed Failures:");
        println!("  Image downloads: {}", stats.image_download_failures);
        println!("  Detail pages: {}", stats.detail_page_failures);
        println!("  PDF downloads: {}", stats.pdf_download_failures);
        println!("  Renders: {}", stats.render_failures);
        println!("  Renderer unavailable: {}", stats.renderer_unavailable);
        println!();
    }

    let acceptance = if stats.rows_seen > 0 {
        (stats.rows_accepted as f64 / stats.rows_seen as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Acceptance Rate: {:.1}% ({} / {} rows)",
        acceptance, stats.rows_accepted, stats.rows_seen
    );
}
