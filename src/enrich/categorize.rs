//! Keyword categorization of publication titles
//!
//! A title is tagged with every topic whose keyword set has at least one
//! substring hit. Tags come back in taxonomy-declaration order, so the first
//! declared topic that matches is always the primary category.

use serde::Deserialize;
use std::collections::HashSet;

/// One entry of the topic taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicRule {
    /// Tag emitted when any keyword matches
    pub tag: String,

    /// Lowercase substrings searched for in the lowercased title
    pub keywords: Vec<String>,
}

/// Built-in taxonomy as `(tag, keywords)` pairs; order is significant.
///
/// `"ct "` keeps its trailing space so it only matches at the end of a word.
pub const DEFAULT_TAXONOMY: &[(&str, &[&str])] = &[
    ("gnn", &["graph", "gnn", "relationformer"]),
    (
        "generative",
        &["gan", "generative", "synthesis", "flow", "diffusion"],
    ),
    (
        "topology",
        &["topolog", "betti", "cldice", "skeleton", "persistence"],
    ),
    ("segmentation", &["segment", "segmentation"]),
    ("detection", &["detection", "detect"]),
    ("classification", &["classification", "classify"]),
    (
        "reconstruction",
        &["reconstruction", "super-resolution", "super resolution"],
    ),
    ("registration", &["registration", "register"]),
    (
        "microscopy",
        &["microscopy", "oct", "octl", "retinal", "vasculature"],
    ),
    ("mri", &["mri", "perfusion"]),
    ("ct", &["ct ", "computed tomography"]),
    ("x-ray", &["x-ray", "xray"]),
    ("histology", &["histology"]),
];

/// Tags titles against an ordered taxonomy
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<TopicRule>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(
            DEFAULT_TAXONOMY
                .iter()
                .map(|(tag, keywords)| TopicRule {
                    tag: (*tag).to_string(),
                    keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
                })
                .collect(),
        )
    }
}

impl Categorizer {
    /// Creates a categorizer over `rules`, preserving their order
    pub fn new(rules: Vec<TopicRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| TopicRule {
                tag: rule.tag,
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { rules }
    }

    /// Uses the configured taxonomy, or the built-in one when none is configured
    pub fn from_rules(rules: &[TopicRule]) -> Self {
        if rules.is_empty() {
            Self::default()
        } else {
            Self::new(rules.to_vec())
        }
    }

    /// Number of topics in the taxonomy
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the matched tags in declaration order, without duplicates
    pub fn categorize(&self, title: &str) -> Vec<String> {
        let title = title.to_lowercase();
        let mut seen = HashSet::new();

        self.rules
            .iter()
            .filter(|rule| rule.keywords.iter().any(|kw| title.contains(kw.as_str())))
            .filter(|rule| seen.insert(rule.tag.as_str()))
            .map(|rule| rule.tag.clone())
            .collect()
    }
}

/// The first tag, if any
pub fn primary_category(categories: &[String]) -> Option<String> {
    categories.first().cloned()
}
