use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, ProfileConfig, RenderBackend, RenderConfig,
    UserAgentConfig,
};
use crate::enrich::TopicRule;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_profile_config(&config.profile)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_render_config(&config.render)?;
    validate_topics(&config.topics)?;
    Ok(())
}

/// Validates the profile section
fn validate_profile_config(config: &ProfileConfig) -> Result<(), ConfigError> {
    if config.profile_id.is_empty() {
        return Err(ConfigError::Validation(
            "profile_id cannot be empty".to_string(),
        ));
    }

    if !config
        .profile_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "profile_id must contain only ASCII letters, digits, '-' and '_', got '{}'",
            config.profile_id
        )));
    }

    validate_http_url("base_url", &config.base_url)?;
    validate_http_url("host", &config.host)?;

    if config.target_author.trim().is_empty() {
        return Err(ConfigError::Validation(
            "target_author cannot be empty".to_string(),
        ));
    }

    if config.language.is_empty() {
        return Err(ConfigError::Validation(
            "language cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.request_delay < 100 {
        return Err(ConfigError::Validation(format!(
            "request_delay must be >= 100ms, got {}ms",
            config.request_delay
        )));
    }

    for (name, secs) in [
        ("page_timeout", config.page_timeout),
        ("image_timeout", config.image_timeout),
        ("pdf_timeout", config.pdf_timeout),
    ] {
        if secs == 0 {
            return Err(ConfigError::Validation(format!("{} must be >= 1s", name)));
        }
    }

    if config.enrich_concurrency < 1 || config.enrich_concurrency > 16 {
        return Err(ConfigError::Validation(format!(
            "enrich_concurrency must be between 1 and 16, got {}",
            config.enrich_concurrency
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.browser.trim().is_empty() {
        return Err(ConfigError::Validation(
            "browser user agent cannot be empty".to_string(),
        ));
    }

    if config.browser.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "browser user agent cannot contain control characters".to_string(),
        ));
    }

    if config.accept_language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "accept_language cannot be empty".to_string(),
        ));
    }

    if config.accept_language.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "accept_language cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("snapshot_path", &config.snapshot_path),
        ("images_dir", &config.images_dir),
        ("pdf_tmp_dir", &config.pdf_tmp_dir),
        ("default_thumbnail", &config.default_thumbnail),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates renderer configuration
fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.backend == RenderBackend::None {
        return Ok(());
    }

    if config.program.is_empty() {
        return Err(ConfigError::Validation(
            "render program cannot be empty".to_string(),
        ));
    }

    if !(36..=600).contains(&config.dpi) {
        return Err(ConfigError::Validation(format!(
            "render dpi must be between 36 and 600, got {}",
            config.dpi
        )));
    }

    Ok(())
}

/// Validates a user-supplied taxonomy
fn validate_topics(topics: &[TopicRule]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for topic in topics {
        if topic.tag.trim().is_empty() {
            return Err(ConfigError::Validation(
                "topic tag cannot be empty".to_string(),
            ));
        }

        if topic.keywords.is_empty() || topic.keywords.iter().any(|k| k.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "topic '{}' needs at least one non-empty keyword",
                topic.tag
            )));
        }

        if !seen.insert(topic.tag.as_str()) {
            return Err(ConfigError::Validation(format!(
                "topic '{}' is declared twice",
                topic.tag
            )));
        }
    }

    Ok(())
}

/// Validates that a value parses as an http(s) URL
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, value
        )));
    }

    Ok(())
}
