//! Publication records as they appear in the snapshot
//!
//! A record is built from one accepted listing row in three steps (base
//! fields, categories, thumbnail) and is never modified after it is appended
//! to the run's record list.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel `featuredOrder` for records nobody has featured
pub const UNFEATURED_ORDER: u32 = 999;

/// One publication in the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Run-scoped id, `scraped_001`, `scraped_002`, ...
    pub id: String,

    pub title: String,

    /// Author list exactly as the listing printed it
    #[serde(rename = "authors")]
    pub authors_raw: String,

    pub year: Option<u16>,

    pub venue: String,

    /// Uppercased venue, or null when the venue is empty
    pub venue_tag: Option<String>,

    /// Never sourced; always null
    pub doi: Option<String>,

    /// Never sourced; always empty
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Absolute URL of the detail page
    pub url: String,

    /// Detail page link relative to the listing host
    #[serde(rename = "scholar_link")]
    pub detail_link: String,

    pub citations: u32,

    /// PDF discovered on the detail page; serialized as `""` when absent
    #[serde(
        serialize_with = "serialize_empty_as_none",
        deserialize_with = "deserialize_empty_as_none"
    )]
    pub pdf_link: Option<String>,

    pub categories: Vec<String>,

    pub primary_category: Option<String>,

    /// Local thumbnail path; always set
    pub thumbnail: String,

    pub featured: bool,

    #[serde(rename = "featuredOrder")]
    pub featured_order: u32,
}

/// Formats the run-scoped id for the `n`-th accepted record (1-based)
pub fn record_id(n: usize) -> String {
    format!("scraped_{:03}", n)
}

/// Uppercased venue, or None for an empty venue
pub fn venue_tag(venue: &str) -> Option<String> {
    if venue.is_empty() {
        None
    } else {
        Some(venue.to_uppercase())
    }
}

fn serialize_empty_as_none<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

fn deserialize_empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
