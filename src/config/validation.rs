use crate::config::types::{
    Config, CrawlerConfig, PathsConfig, SelectorConfig, SourceConfig, SourceKind, UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_paths_config(&config.paths)?;
    validate_source_config(&config.source)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation("crawler name cannot be empty".to_string()));
    }

    if config
        .name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '\\'))
    {
        return Err(ConfigError::Validation(format!(
            "crawler name must not contain whitespace or path separators, got '{}'",
            config.name
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one output format is required".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    if config.metadata_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "metadata_path cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if matches!(&config.checkpoint_path, Some(p) if p.as_os_str().is_empty()) {
        return Err(ConfigError::Validation(
            "checkpoint_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if config.retries > 10 {
        return Err(ConfigError::Validation(format!(
            "retries must be between 0 and 10, got {}",
            config.retries
        )));
    }

    match (config.kind, &config.selectors) {
        (SourceKind::Html, None) => Err(ConfigError::Validation(
            "[source.selectors] is required for the html source".to_string(),
        )),
        (SourceKind::Html, Some(selectors)) => validate_selectors(selectors),
        (SourceKind::Json, _) => Ok(()),
    }
}

fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ConfigError> {
    let required = [
        ("chapter-link", Some(&selectors.chapter_link)),
        ("content", Some(&selectors.content)),
        ("block", Some(&selectors.block)),
        ("footnote-ref", selectors.footnote_ref.as_ref()),
        ("footnote-body", selectors.footnote_body.as_ref()),
    ];

    for (name, css) in required {
        if let Some(css) = css {
            Selector::parse(css).map_err(|e| {
                ConfigError::InvalidSelector(format!("{} selector '{}': {}", name, css, e))
            })?;
        }
    }

    Ok(())
}

/// Validates an email address (basic validation)
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email address '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email address '{}'",
            email
        )));
    }

    Ok(())
}
