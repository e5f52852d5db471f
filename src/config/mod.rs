//! Configuration module for Scholar-Snapshot
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use scholar_snapshot::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("snapshot.toml")).unwrap();
//! println!("Crawling at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, ProfileConfig, RenderBackend, RenderConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
