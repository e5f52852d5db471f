//! Crawler coordinator - main extraction loop
//!
//! This module drives one run from the first listing page to a terminal
//! `StopReason`:
//! - Fetching listing pages in order with a polite delay between them
//! - Parsing rows and applying the author filter
//! - Assigning ids, categories and slugs in row order
//! - Resolving thumbnails with bounded per-page concurrency
//! - Collecting statistics for the final summary

use crate::config::Config;
use crate::crawler::{build_http_client, PageFetcher, ParsedRow, RowOutcome, RowParser};
use crate::enrich::{primary_category, Categorizer, FilenameAllocator};
use crate::output::CrawlStats;
use crate::state::{record_id, venue_tag, PublicationRecord, StopReason, UNFEATURED_ORDER};
use crate::thumbnail::{renderer_from_config, ImagePipeline, PageRenderer};
use crate::url::canonical_url;
use crate::SnapshotError;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Everything a finished run produced
#[derive(Debug)]
pub struct CrawlReport {
    /// Accepted records in listing order
    pub records: Vec<PublicationRecord>,
    pub stop_reason: StopReason,
    pub stats: CrawlStats,
}

impl CrawlReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An accepted row waiting for its thumbnail
struct PendingRecord {
    row: ParsedRow,
    slug: String,
    record: PublicationRecord,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: PageFetcher,
    parser: RowParser,
    categorizer: Categorizer,
    allocator: FilenameAllocator,
    pipeline: ImagePipeline,
    host: Url,
    default_thumbnail: String,
    max_pages: usize,
    request_delay: Duration,
    enrich_concurrency: usize,
    records: Vec<PublicationRecord>,
    stats: CrawlStats,
}

impl Coordinator {
    /// Creates a coordinator using the renderer selected by the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SnapshotError)` - The HTTP client, a URL or a selector could not be built
    pub fn new(config: &Config) -> Result<Self, SnapshotError> {
        Self::with_renderer(config, renderer_from_config(&config.render))
    }

    /// Creates a coordinator with an explicit first-page renderer
    pub fn with_renderer(
        config: &Config,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, SnapshotError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.page_timeout),
        )?;
        let host = Url::parse(&config.profile.host)?;

        tracing::debug!(
            "Renderer: {} (available: {})",
            renderer.name(),
            renderer.available()
        );

        Ok(Self {
            fetcher: PageFetcher::new(client.clone(), &config.profile, &config.crawler)?,
            parser: RowParser::new(
                &config.profile.target_author,
                host.clone(),
                config.profile.image_host_filter.clone(),
            )?,
            categorizer: Categorizer::from_rules(&config.topics),
            allocator: FilenameAllocator::default(),
            pipeline: ImagePipeline::new(client, config, renderer)?,
            host,
            default_thumbnail: config.output.default_thumbnail.clone(),
            max_pages: config.crawler.max_pages,
            request_delay: Duration::from_millis(config.crawler.request_delay),
            enrich_concurrency: config.crawler.enrich_concurrency.max(1),
            records: Vec::new(),
            stats: CrawlStats::new(),
        })
    }

    /// Runs the pagination loop to completion
    ///
    /// Never fails: a listing page that cannot be fetched ends the run as
    /// `StopReason::Aborted` and the records gathered so far are returned.
    pub async fn run(&mut self) -> CrawlReport {
        let page_size = self.fetcher.page_size();
        let mut page = 0usize;

        tracing::info!(
            "Starting extraction: up to {} pages of {} rows",
            self.max_pages,
            page_size
        );

        let stop_reason = loop {
            let offset = page * page_size;
            let html = match self.fetcher.fetch(offset).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!("Listing page {} failed: {}", page + 1, e);
                    break StopReason::Aborted(e);
                }
            };
            self.stats.pages_fetched += 1;

            let outcomes = self.parser.parse_listing(&html);
            let row_count = outcomes.len();
            self.stats.rows_seen += row_count;

            if row_count == 0 {
                if page == 0 {
                    tracing::warn!("No publications found on the first page (blocked or empty?)");
                    break StopReason::EmptyProfile;
                }
                break StopReason::Exhausted;
            }

            let accepted = self.process_page(outcomes).await;
            tracing::info!(
                "Page {} (offset {}): {} rows, {} accepted, {} records so far",
                page + 1,
                offset,
                row_count,
                accepted,
                self.records.len()
            );

            if row_count < page_size {
                break StopReason::LastPage;
            }

            page += 1;
            if page >= self.max_pages {
                tracing::info!("Reached the cap of {} pages", self.max_pages);
                break StopReason::PageCap;
            }

            tokio::time::sleep(self.request_delay).await;
        };

        tracing::info!(
            "Extraction finished ({}): {} records, {} thumbnail slugs allocated",
            stop_reason,
            self.records.len(),
            self.allocator.registry().len()
        );

        CrawlReport {
            records: std::mem::take(&mut self.records),
            stop_reason,
            stats: std::mem::take(&mut self.stats),
        }
    }

    /// Turns one page of row outcomes into records
    ///
    /// Ids and slugs are handed out in row order before any network work, and
    /// resolved thumbnails are collected in the same order, so the records
    /// appended here do not depend on which download finishes first.
    async fn process_page(&mut self, outcomes: Vec<RowOutcome>) -> usize {
        let mut pending = Vec::new();

        for outcome in outcomes {
            match outcome {
                RowOutcome::Accepted(row) => {
                    let n = self.records.len() + pending.len() + 1;
                    let slug = self.allocator.allocate(&row.title);
                    let record = self.base_record(n, &row);
                    tracing::debug!("Accepted '{}' as {} ({})", row.title, record.id, slug);
                    pending.push(PendingRecord { row, slug, record });
                }
                RowOutcome::Rejected(reason) => {
                    tracing::debug!("Skipped row: {:?}", reason);
                    self.stats.record_rejection(reason);
                }
            }
        }

        let pipeline = &self.pipeline;
        let resolved: Vec<_> = stream::iter(pending.iter())
            .map(|p| pipeline.resolve(&p.row, &p.slug))
            .buffered(self.enrich_concurrency)
            .collect()
            .await;

        let accepted = pending.len();
        self.stats.rows_accepted += accepted;

        for (p, thumbnail) in pending.into_iter().zip(resolved) {
            self.stats.record_thumbnail(&thumbnail);
            let mut record = p.record;
            record.thumbnail = thumbnail.path;
            record.pdf_link = thumbnail.pdf_link;
            self.records.push(record);
        }

        accepted
    }

    /// Builds a record from an accepted row with the default thumbnail
    fn base_record(&self, n: usize, row: &ParsedRow) -> PublicationRecord {
        let categories = self.categorizer.categorize(&row.title);
        PublicationRecord {
            id: record_id(n),
            title: row.title.clone(),
            authors_raw: row.authors_raw.clone(),
            year: row.year,
            venue: row.venue.clone(),
            venue_tag: venue_tag(&row.venue),
            doi: None,
            abstract_text: String::new(),
            url: canonical_url(&row.detail_link, &self.host),
            detail_link: row.detail_link.clone(),
            citations: row.citations,
            pdf_link: None,
            primary_category: primary_category(&categories),
            categories,
            thumbnail: self.default_thumbnail.clone(),
            featured: false,
            featured_order: UNFEATURED_ORDER,
        }
    }
}
