//! HTML parsing for listing rows and detail pages
//!
//! This module handles:
//! - Splitting a listing page into rows
//! - Extracting title, authors, venue, year, citations and thumbnail per row
//! - The author-inclusion filter
//! - Finding a PDF link on a publication's detail page

use crate::url::{absolutize, is_absolute_http};
use crate::SnapshotError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Authors at the head of the list that count as significant contributors
const LEADING_AUTHOR_WINDOW: usize = 3;

/// Authors at the tail of the list that count as significant contributors
const TRAILING_AUTHOR_WINDOW: usize = 2;

/// Fields extracted from one accepted listing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub title: String,
    pub authors_raw: String,
    pub venue: String,
    pub year: Option<u16>,
    pub citations: u32,
    /// Detail page link as printed in the listing (usually host-relative)
    pub detail_link: String,
    /// Absolute URL of the listing thumbnail, if the row had one
    pub thumbnail_url: Option<String>,
}

/// Why a row was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Neither title locator matched
    MissingTitle,
    /// The target author is not among the leading or trailing authors
    AuthorFilter,
}

/// Result of parsing one row; rejections are skips, not failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(ParsedRow),
    Rejected(RejectReason),
}

/// Compiled selectors for the listing layout
#[derive(Debug, Clone)]
struct RowSelectors {
    row: Selector,
    title_primary: Selector,
    title_fallback: Selector,
    gray: Selector,
    year: Selector,
    citations: Selector,
    thumbnail: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self, SnapshotError> {
        Ok(Self {
            row: parse_selector(".gsc_a_tr")?,
            title_primary: parse_selector("a.gsc_a_at")?,
            title_fallback: parse_selector(".gsc_a_t a")?,
            gray: parse_selector(".gsc_a_t .gs_gray")?,
            year: parse_selector(".gsc_a_y span")?,
            citations: parse_selector(".gsc_a_c a")?,
            thumbnail: parse_selector(".gsc_a_t img, .gsc_a_I img")?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SnapshotError> {
    Selector::parse(selector).map_err(|e| SnapshotError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Parses listing rows and applies the author-inclusion filter
#[derive(Debug, Clone)]
pub struct RowParser {
    selectors: RowSelectors,
    year_pattern: Regex,
    target_author: String,
    host: Url,
    image_host_filter: Option<String>,
}

impl RowParser {
    /// Creates a parser
    ///
    /// # Arguments
    ///
    /// * `target_author` - Surname searched for in the author list (case-insensitive)
    /// * `host` - Base for resolving relative image sources
    /// * `image_host_filter` - When set, listing images whose source does not contain it are ignored
    pub fn new(
        target_author: &str,
        host: Url,
        image_host_filter: Option<String>,
    ) -> Result<Self, SnapshotError> {
        let year_pattern = Regex::new(r"(?:19|20)\d{2}").map_err(|e| SnapshotError::Selector {
            selector: "year pattern".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            selectors: RowSelectors::new()?,
            year_pattern,
            target_author: target_author.trim().to_lowercase(),
            host,
            image_host_filter,
        })
    }

    /// Parses every row of a listing page, in document order
    ///
    /// The returned vector has one entry per row, so its length is the page's
    /// row count whether or not any row was accepted.
    pub fn parse_listing(&self, html: &str) -> Vec<RowOutcome> {
        let document = Html::parse_document(html);
        document
            .select(&self.selectors.row)
            .map(|row| self.parse_row(row))
            .collect()
    }

    /// Parses a single listing row
    pub fn parse_row(&self, row: ElementRef<'_>) -> RowOutcome {
        // First anchor with text wins; the fallback locator is tried after the primary one
        let title_anchor = row
            .select(&self.selectors.title_primary)
            .chain(row.select(&self.selectors.title_fallback))
            .find(|anchor| !element_text(anchor).is_empty());

        let Some(title_anchor) = title_anchor else {
            return RowOutcome::Rejected(RejectReason::MissingTitle);
        };
        let title = element_text(&title_anchor);

        let mut gray = row.select(&self.selectors.gray);
        let authors_raw = gray.next().map(|e| e.text().collect::<String>()).unwrap_or_default();
        let venue_year_raw = gray.next().map(|e| e.text().collect::<String>()).unwrap_or_default();

        if !is_prominent_author(&authors_raw, &self.target_author) {
            return RowOutcome::Rejected(RejectReason::AuthorFilter);
        }

        let explicit_year = row
            .select(&self.selectors.year)
            .next()
            .and_then(|e| parse_explicit_year(&element_text(&e)));
        let year = explicit_year.or_else(|| self.scan_year(&venue_year_raw));
        let venue = self.strip_years(&venue_year_raw);

        let citations = row
            .select(&self.selectors.citations)
            .next()
            .and_then(|e| parse_count(&element_text(&e)))
            .unwrap_or(0);

        let detail_link = title_anchor
            .value()
            .attr("href")
            .unwrap_or_default()
            .trim()
            .to_string();

        let thumbnail_url = row
            .select(&self.selectors.thumbnail)
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|src| self.image_host_allowed(src))
            .and_then(|src| absolutize(src, &self.host));

        RowOutcome::Accepted(ParsedRow {
            title,
            authors_raw,
            venue,
            year,
            citations,
            detail_link,
            thumbnail_url,
        })
    }

    /// First `19xx`/`20xx` token in the venue+year text
    pub fn scan_year(&self, text: &str) -> Option<u16> {
        self.year_pattern
            .find(text)
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Venue+year text with every year token removed and the edges stripped
    pub fn strip_years(&self, text: &str) -> String {
        let without_years = self.year_pattern.replace_all(text, "");
        without_years
            .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .to_string()
    }

    fn image_host_allowed(&self, src: &str) -> bool {
        match &self.image_host_filter {
            Some(filter) => src.contains(filter.as_str()),
            None => !src.trim().is_empty(),
        }
    }
}

/// Author-inclusion heuristic
///
/// Splits the author string on commas and accepts when `surname` is a
/// substring of one of the first three or last two authors. Listings
/// truncated with "..." still work because the window only looks at the
/// ends of the list.
///
/// # Examples
///
/// ```
/// use scholar_snapshot::crawler::is_prominent_author;
///
/// assert!(is_prominent_author("A Smith, JC Paetzold, B Jones", "paetzold"));
/// assert!(!is_prominent_author("A, B, C, JC Paetzold, E, F", "paetzold"));
/// ```
pub fn is_prominent_author(authors_raw: &str, surname: &str) -> bool {
    let surname = surname.trim().to_lowercase();
    if surname.is_empty() {
        return false;
    }

    let authors: Vec<String> = authors_raw
        .split(',')
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();

    let leading = authors.iter().take(LEADING_AUTHOR_WINDOW);
    let trailing = authors
        .iter()
        .skip(authors.len().saturating_sub(TRAILING_AUTHOR_WINDOW));

    leading.chain(trailing).any(|a| a.contains(surname.as_str()))
}

/// Finds the first absolute PDF link on a detail page
///
/// An anchor qualifies when its visible text contains "pdf" or its target
/// ends in ".pdf" (both case-insensitive), and its target is an absolute
/// http(s) URL.
pub fn extract_pdf_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a").ok()?;

    document.select(&anchor_selector).find_map(|a| {
        let href = a.value().attr("href")?.trim();
        let text = a.text().collect::<String>().to_lowercase();
        let looks_like_pdf = text.contains("pdf") || href.to_lowercase().ends_with(".pdf");

        (looks_like_pdf && is_absolute_http(href)).then(|| href.to_string())
    })
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_explicit_year(text: &str) -> Option<u16> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<u16>()
        .ok()
        .filter(|year| (1900..=2099).contains(year))
}

fn parse_count(text: &str) -> Option<u32> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
