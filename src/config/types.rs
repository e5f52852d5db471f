use crate::enrich::TopicRule;
use serde::{Deserialize, Deserializer};

/// Main configuration structure for Scholar-Snapshot
///
/// Every section is optional; a missing section or key falls back to the
/// values the scraper has always run with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub profile: ProfileConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub render: RenderConfig,
    /// Ordered topic taxonomy; empty means the built-in table
    #[serde(rename = "topic")]
    pub topics: Vec<TopicRule>,
}

/// The profile being extracted and the listing service it lives on
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Opaque profile identifier passed as the `user` query parameter
    #[serde(rename = "profile-id")]
    pub profile_id: String,

    /// Listing endpoint
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Host used to absolutize relative links and image sources
    pub host: String,

    /// Interface language passed as the `hl` query parameter
    pub language: String,

    /// Surname the author filter looks for
    #[serde(rename = "target-author")]
    pub target_author: String,

    /// Listing images are only kept when their source contains this host
    ///
    /// `""` or `"none"` turns the filter off, so any non-empty source is kept.
    #[serde(rename = "image-host-filter", deserialize_with = "deserialize_host_filter")]
    pub image_host_filter: Option<String>,
}

/// Maps `""` and `"none"` (any case) to no filter
fn deserialize_host_filter<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        Ok(Some(value.to_string()))
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            profile_id: "7Bv7PmgAAAAJ".to_string(),
            base_url: "https://scholar.google.com/citations".to_string(),
            host: "https://scholar.google.com".to_string(),
            language: "en".to_string(),
            target_author: "paetzold".to_string(),
            image_host_filter: Some("scholar.googleusercontent.com".to_string()),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Rows requested per listing page
    #[serde(rename = "page-size")]
    pub page_size: usize,

    /// Hard cap on listing pages fetched in one run
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Polite delay between listing pages (milliseconds)
    #[serde(rename = "request-delay")]
    pub request_delay: u64,

    /// Timeout for listing and detail pages (seconds)
    #[serde(rename = "page-timeout")]
    pub page_timeout: u64,

    /// Timeout for listing thumbnail downloads (seconds)
    #[serde(rename = "image-timeout")]
    pub image_timeout: u64,

    /// Timeout for PDF downloads (seconds)
    #[serde(rename = "pdf-timeout")]
    pub pdf_timeout: u64,

    /// Records of one page enriched at the same time
    #[serde(rename = "enrich-concurrency")]
    pub enrich_concurrency: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 10,
            request_delay: 1200,
            page_timeout: 20,
            image_timeout: 15,
            pdf_timeout: 30,
            enrich_concurrency: 1,
        }
    }
}

/// Browser identification sent with every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Full `User-Agent` header value
    pub browser: String,

    /// `Accept-Language` header value
    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            browser: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                      (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the JSON snapshot
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,

    /// Directory receiving downloaded and rendered thumbnails
    #[serde(rename = "images-dir")]
    pub images_dir: String,

    /// Directory receiving downloaded PDFs
    #[serde(rename = "pdf-tmp-dir")]
    pub pdf_tmp_dir: String,

    /// Thumbnail used when nothing better resolves; never written
    #[serde(rename = "default-thumbnail")]
    pub default_thumbnail: String,

    /// Write the snapshot even when no record qualified
    #[serde(rename = "write-empty")]
    pub write_empty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "data/publications_scraped.json".to_string(),
            images_dir: "images/publications/thumbnails".to_string(),
            pdf_tmp_dir: "data/tmp_pdfs".to_string(),
            default_thumbnail: "images/publications/default.png".to_string(),
            write_empty: false,
        }
    }
}

/// Which first-page renderer to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackend {
    /// Poppler's `pdftoppm`
    Pdftoppm,
    /// No rendering; PDF covers are never used
    None,
}

/// PDF cover rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub backend: RenderBackend,

    /// Program name or path of the renderer
    pub program: String,

    /// Rendering resolution
    pub dpi: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: RenderBackend::Pdftoppm,
            program: "pdftoppm".to_string(),
            dpi: 144,
        }
    }
}
