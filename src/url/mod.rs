//! URL handling module for Scholar-Snapshot
//!
//! Listing pages hand out links and image sources in absolute,
//! protocol-relative (`//host/path`) and path-relative (`/path`) forms. Every
//! one of them is resolved against the configured host before use.

use url::Url;

/// Resolves `raw` against `host`
///
/// # Returns
///
/// * `Some(String)` - Absolute http(s) URL
/// * `None` - Empty input, non-http(s) scheme, or unparsable link
///
/// # Examples
///
/// ```
/// use scholar_snapshot::url::absolutize;
/// use url::Url;
///
/// let host = Url::parse("https://scholar.google.com").unwrap();
/// assert_eq!(
///     absolutize("/citations?view_op=view_citation", &host).as_deref(),
///     Some("https://scholar.google.com/citations?view_op=view_citation")
/// );
/// assert_eq!(
///     absolutize("//lh3.googleusercontent.com/a.jpg", &host).as_deref(),
///     Some("https://lh3.googleusercontent.com/a.jpg")
/// );
/// ```
pub fn absolutize(raw: &str, host: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Url::join already handles "//host/..." by inheriting the base scheme
    let resolved = host.join(raw).ok()?;

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Returns true for links that are already absolute http(s) URLs
pub fn is_absolute_http(link: &str) -> bool {
    let lower = link.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Canonical URL of a record: the host joined with its detail link
///
/// An empty or unresolvable link yields the host itself, so every record
/// carries some URL.
pub fn canonical_url(detail_link: &str, host: &Url) -> String {
    absolutize(detail_link, host).unwrap_or_else(|| host.to_string())
}
