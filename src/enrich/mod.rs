//! Per-record enrichment that needs no network access
//!
//! - Topic categorization of titles
//! - Collision-free slug allocation for on-disk artifacts

mod categorize;
mod filename;

pub use categorize::{primary_category, Categorizer, TopicRule, DEFAULT_TAXONOMY};
pub use filename::{
    slug_digest, slugify, FilenameAllocator, FilenameRegistry, MAX_SLUG_LEN, SUFFIX_HEX_LEN,
};
