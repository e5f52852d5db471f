//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the extractor, including:
//! - Building an HTTP client that identifies as a browser
//! - Listing page requests (`PageFetcher`)
//! - Plain text GETs for detail pages
//! - Streaming downloads for thumbnails and PDFs
//! - Error classification into `FetchError`

use crate::config::{CrawlerConfig, ProfileConfig, UserAgentConfig};
use crate::{FetchError, SnapshotError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Builds an HTTP client with browser-like identification
///
/// The listing service blocks default client identifiers, so every request
/// carries the configured browser `User-Agent` plus matching `Accept` and
/// `Accept-Language` headers.
///
/// # Example
///
/// ```no_run
/// use scholar_snapshot::config::UserAgentConfig;
/// use scholar_snapshot::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(20)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, SnapshotError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    let language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
        SnapshotError::Config(crate::ConfigError::Validation(format!(
            "accept_language is not a valid header value: {}",
            e
        )))
    })?;
    headers.insert(ACCEPT_LANGUAGE, language);

    let user_agent = HeaderValue::from_str(&config.browser).map_err(|e| {
        SnapshotError::Config(crate::ConfigError::Validation(format!(
            "browser user agent is not a valid header value: {}",
            e
        )))
    })?;
    headers.insert(USER_AGENT, user_agent);

    let client = Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches one listing page at a time
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    base_url: Url,
    profile_id: String,
    language: String,
    page_size: usize,
    timeout: Duration,
}

impl PageFetcher {
    /// Creates a fetcher for the configured profile
    pub fn new(
        client: Client,
        profile: &ProfileConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, SnapshotError> {
        Ok(Self {
            client,
            base_url: Url::parse(&profile.base_url)?,
            profile_id: profile.profile_id.clone(),
            language: profile.language.clone(),
            page_size: crawler.page_size,
            timeout: Duration::from_secs(crawler.page_timeout),
        })
    }

    /// Rows requested per page; offsets advance by this amount
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Builds the listing URL for the page starting at `offset`
    pub fn page_url(&self, offset: usize) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("user", &self.profile_id)
            .append_pair("hl", &self.language)
            .append_pair("cstart", &offset.to_string())
            .append_pair("pagesize", &self.page_size.to_string());
        url
    }

    /// Fetches the listing page starting at `offset` and returns its HTML
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Response body of a 2xx response
    /// * `Err(FetchError)` - Network failure, timeout, or non-2xx status
    pub async fn fetch(&self, offset: usize) -> Result<String, FetchError> {
        let url = self.page_url(offset);
        tracing::debug!("Fetching listing page: {}", url);
        get_text(&self.client, url.as_str(), self.timeout).await
    }
}

/// GETs `url` and returns the body of a 2xx response as text
pub async fn get_text(client: &Client, url: &str, timeout: Duration) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))
}

/// Streams `url` into `path`, creating parent directories as needed
///
/// # Returns
///
/// * `Ok(u64)` - Bytes written
/// * `Err(FetchError)` - Network, status, or filesystem failure
pub async fn download_to(
    client: &Client,
    url: &str,
    path: &Path,
    timeout: Duration,
) -> Result<u64, FetchError> {
    let mut response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let io_err = |source: std::io::Error| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    let mut written = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?
    {
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(io_err)?;
    tracing::debug!("Downloaded {} bytes from {} -> {}", written, url, path.display());

    Ok(written)
}
