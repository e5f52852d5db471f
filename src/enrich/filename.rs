//! Collision-free filename allocation
//!
//! Titles are slugged into `[a-z0-9_]` identifiers used as thumbnail and PDF
//! file stems. The first record to claim a slug keeps it; later records with
//! the same slug get a short digest suffix.

use sha1::{Digest, Sha1};
use std::collections::HashSet;

/// Maximum slug length before any suffix is appended
pub const MAX_SLUG_LEN: usize = 120;

/// Hex characters of the digest appended on collision
pub const SUFFIX_HEX_LEN: usize = 6;

/// Slug used when a title has no `[a-z0-9]` characters at all
const EMPTY_SLUG: &str = "untitled";

/// Converts a title into a filesystem-safe slug
///
/// Lowercases and trims the title, collapses each run of characters outside
/// `[a-z0-9]` into a single `_`, trims `_` from both ends and truncates to
/// `max_len` characters.
///
/// # Examples
///
/// ```
/// use scholar_snapshot::enrich::slugify;
///
/// assert_eq!(slugify("  My Paper: Part II! ", 120), "my_paper_part_ii");
/// assert_eq!(slugify("Ünïcode—Title", 120), "n_code_title");
/// ```
pub fn slugify(title: &str, max_len: usize) -> String {
    let lowered = title.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    // ASCII only, so byte truncation is char truncation
    slug.truncate(max_len);
    slug
}

/// Short stable digest of a base slug
///
/// First hex characters of the SHA-1 of the slug, the same suffix earlier
/// snapshots used for their thumbnail files.
pub fn slug_digest(base_slug: &str) -> String {
    let digest = hex::encode(Sha1::digest(base_slug.as_bytes()));
    digest[..SUFFIX_HEX_LEN].to_string()
}

/// Slugs already handed out during this run
#[derive(Debug, Default, Clone)]
pub struct FilenameRegistry {
    used: HashSet<String>,
}

impl FilenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `slug`; returns false if it was already taken
    fn reserve(&mut self, slug: &str) -> bool {
        self.used.insert(slug.to_string())
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// Hands out unique slugs for titles across a whole run
#[derive(Debug, Clone)]
pub struct FilenameAllocator {
    max_len: usize,
    registry: FilenameRegistry,
}

impl Default for FilenameAllocator {
    fn default() -> Self {
        Self::new(MAX_SLUG_LEN)
    }
}

impl FilenameAllocator {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            registry: FilenameRegistry::new(),
        }
    }

    pub fn registry(&self) -> &FilenameRegistry {
        &self.registry
    }

    /// Allocates a slug for `title` that no earlier call returned
    ///
    /// 1. Bare slug, if unused
    /// 2. `<slug>_<6 hex digest chars>`
    /// 3. `<slug>_<digest>_2`, `_3`, ... for further repeats of the same title
    pub fn allocate(&mut self, title: &str) -> String {
        let mut base = slugify(title, self.max_len);
        if base.is_empty() {
            base = EMPTY_SLUG.to_string();
        }

        if self.registry.reserve(&base) {
            return base;
        }

        let suffixed = format!("{}_{}", base, slug_digest(&base));
        if self.registry.reserve(&suffixed) {
            return suffixed;
        }

        let mut counter = 2u32;
        loop {
            let candidate = format!("{}_{}", suffixed, counter);
            if self.registry.reserve(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}
