//! Thumbnail resolution for accepted rows
//!
//! Every record ends up with exactly one local thumbnail path, chosen in
//! priority order:
//!
//! 1. Rendered first page of the PDF linked from the detail page
//! 2. Image shown next to the row in the listing
//! 3. The static default asset
//!
//! Network and rendering failures only move a record down this list; they
//! are logged and counted but never drop the record.

mod render;

pub use render::{renderer_from_config, NoopRenderer, PageRenderer, PdftoppmRenderer, RenderError};

use crate::config::Config;
use crate::crawler::{download_to, extract_pdf_link, get_text, ParsedRow};
use crate::url::absolutize;
use crate::SnapshotError;
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Where a record's thumbnail came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailSource {
    /// Downloaded from the listing row
    Listing,
    /// Rendered from the first page of the linked PDF
    PdfCover,
    /// The static default asset
    Default,
}

impl fmt::Display for ThumbnailSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Listing => "listing",
            Self::PdfCover => "pdf_cover",
            Self::Default => "default",
        };
        write!(f, "{}", name)
    }
}

/// A failure absorbed while resolving a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Degradation {
    ImageDownload,
    DetailPage,
    PdfDownload,
    Render,
    RendererUnavailable,
}

/// Outcome of the thumbnail chain for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedThumbnail {
    /// Local path written into the record
    pub path: String,
    pub source: ThumbnailSource,
    /// PDF link found on the detail page, even if it could not be rendered
    pub pdf_link: Option<String>,
    pub degradations: Vec<Degradation>,
}

/// Downloads, renders and falls back to produce one thumbnail per record
pub struct ImagePipeline {
    client: Client,
    host: Url,
    images_dir: PathBuf,
    pdf_tmp_dir: PathBuf,
    default_thumbnail: String,
    renderer: Arc<dyn PageRenderer>,
    page_timeout: Duration,
    image_timeout: Duration,
    pdf_timeout: Duration,
}

impl ImagePipeline {
    /// Creates a pipeline using the configured directories and timeouts
    pub fn new(
        client: Client,
        config: &Config,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, SnapshotError> {
        Ok(Self {
            client,
            host: Url::parse(&config.profile.host)?,
            images_dir: PathBuf::from(&config.output.images_dir),
            pdf_tmp_dir: PathBuf::from(&config.output.pdf_tmp_dir),
            default_thumbnail: config.output.default_thumbnail.clone(),
            renderer,
            page_timeout: Duration::from_secs(config.crawler.page_timeout),
            image_timeout: Duration::from_secs(config.crawler.image_timeout),
            pdf_timeout: Duration::from_secs(config.crawler.pdf_timeout),
        })
    }

    /// Local path of the listing thumbnail for `slug`
    pub fn listing_path(&self, slug: &str) -> PathBuf {
        self.images_dir.join(format!("{}.jpg", slug))
    }

    /// Local path of the rendered PDF cover for `slug`
    pub fn cover_path(&self, slug: &str) -> PathBuf {
        self.images_dir.join(format!("{}_pdf.jpg", slug))
    }

    /// Local path of the downloaded PDF for `slug`
    pub fn pdf_path(&self, slug: &str) -> PathBuf {
        self.pdf_tmp_dir.join(format!("{}.pdf", slug))
    }

    /// Resolves the thumbnail for one accepted row
    ///
    /// All steps for the record finish before the override is applied, so
    /// the result is the same however the steps are scheduled.
    pub async fn resolve(&self, row: &ParsedRow, slug: &str) -> ResolvedThumbnail {
        let mut degradations = Vec::new();

        let listing = match &row.thumbnail_url {
            Some(url) => {
                let path = self.listing_path(slug);
                match download_to(&self.client, url, &path, self.image_timeout).await {
                    Ok(_) => {
                        tracing::info!("Downloaded thumbnail -> {}", path.display());
                        Some(path)
                    }
                    Err(e) => {
                        tracing::warn!("Thumbnail download failed for '{}': {}", row.title, e);
                        degradations.push(Degradation::ImageDownload);
                        None
                    }
                }
            }
            None => None,
        };

        let pdf_link = self.discover_pdf(row, &mut degradations).await;

        let cover = match &pdf_link {
            Some(link) => self.render_cover(link, slug, &mut degradations).await,
            None => None,
        };

        let (path, source) = match (cover, listing) {
            (Some(cover), _) => (path_string(&cover), ThumbnailSource::PdfCover),
            (None, Some(listing)) => (path_string(&listing), ThumbnailSource::Listing),
            (None, None) => (self.default_thumbnail.clone(), ThumbnailSource::Default),
        };

        ResolvedThumbnail {
            path,
            source,
            pdf_link,
            degradations,
        }
    }

    /// Fetches the detail page and looks for a PDF link on it
    async fn discover_pdf(
        &self,
        row: &ParsedRow,
        degradations: &mut Vec<Degradation>,
    ) -> Option<String> {
        let detail_url = absolutize(&row.detail_link, &self.host)?;

        match get_text(&self.client, &detail_url, self.page_timeout).await {
            Ok(html) => {
                let link = extract_pdf_link(&html);
                if let Some(link) = &link {
                    tracing::debug!("Found PDF for '{}': {}", row.title, link);
                }
                link
            }
            Err(e) => {
                tracing::warn!("Detail page unavailable for '{}': {}", row.title, e);
                degradations.push(Degradation::DetailPage);
                None
            }
        }
    }

    /// Downloads the PDF and renders its first page
    ///
    /// The PDF is kept in the temp directory even when no renderer is
    /// available.
    async fn render_cover(
        &self,
        pdf_link: &str,
        slug: &str,
        degradations: &mut Vec<Degradation>,
    ) -> Option<PathBuf> {
        let pdf_path = self.pdf_path(slug);
        if let Err(e) = download_to(&self.client, pdf_link, &pdf_path, self.pdf_timeout).await {
            tracing::warn!("PDF download failed: {}", e);
            degradations.push(Degradation::PdfDownload);
            return None;
        }

        if !self.renderer.available() {
            tracing::debug!("No renderer for {}, keeping the PDF only", pdf_path.display());
            degradations.push(Degradation::RendererUnavailable);
            return None;
        }

        let cover_path = self.cover_path(slug);
        let renderer = Arc::clone(&self.renderer);
        let (pdf, out) = (pdf_path.clone(), cover_path.clone());
        let rendered =
            tokio::task::spawn_blocking(move || renderer.render_first_page(&pdf, &out)).await;

        match rendered {
            Ok(Ok(())) => {
                tracing::info!("Rendered PDF cover -> {}", cover_path.display());
                Some(cover_path)
            }
            Ok(Err(RenderError::Unavailable(reason))) => {
                tracing::warn!("Renderer unavailable: {}", reason);
                degradations.push(Degradation::RendererUnavailable);
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("Cover render failed for {}: {}", pdf_path.display(), e);
                degradations.push(Degradation::Render);
                None
            }
            Err(e) => {
                tracing::warn!("Cover render task failed: {}", e);
                degradations.push(Degradation::Render);
                None
            }
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
