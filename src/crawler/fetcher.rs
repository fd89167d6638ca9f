//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the content sources, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for chapter lists, page bodies and markdown
//! - A small retry budget for transient failures
//! - Error classification into `CollaboratorError`

use crate::config::UserAgentConfig;
use crate::task::TaskContext;
use crate::CollaboratorError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// How often and how patiently a request is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use corpus_harvest::config::UserAgentConfig;
/// use corpus_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "CorpusHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent(config))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Format: CrawlerName/Version (+ContactURL; ContactEmail)
pub fn user_agent(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Fetches a URL body as text
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return the body |
/// | HTTP 4xx | Fail immediately |
/// | HTTP 5xx | Retry up to `policy.retries` times |
/// | Timeout / connection error | Retry up to `policy.retries` times |
/// | Cancellation | Fail immediately with `Cancelled` |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `policy` - Retry budget
/// * `ctx` - Context of the timed task this request belongs to
pub async fn fetch_text(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
    ctx: &TaskContext,
) -> Result<String, CollaboratorError> {
    let mut attempt = 0;
    loop {
        if ctx.is_cancelled() {
            return Err(cancelled(url));
        }

        let result = tokio::select! {
            result = fetch_once(client, url) => result,
            _ = ctx.cancelled() => return Err(cancelled(url)),
        };

        match result {
            Ok(body) => return Ok(body),
            Err(e) if e.is_transient() && attempt < policy.retries => {
                attempt += 1;
                warn!(
                    "Fetch of {} failed ({}), retry {}/{}",
                    url, e, attempt, policy.retries
                );
                tokio::select! {
                    _ = tokio::time::sleep(policy.delay) => {}
                    _ = ctx.cancelled() => return Err(cancelled(url)),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fetches a URL and decodes its body as JSON
pub async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
    ctx: &TaskContext,
) -> Result<T, CollaboratorError> {
    let body = fetch_text(client, url, policy, ctx).await?;
    serde_json::from_str(&body).map_err(|e| CollaboratorError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

async fn fetch_once(client: &Client, url: &str) -> Result<String, CollaboratorError> {
    debug!("GET {}", url);
    let http = |source| CollaboratorError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(http)?;
    let status = response.status();
    if !status.is_success() {
        return Err(CollaboratorError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(http)
}

/// Resolves a possibly relative link against the page it was found on
pub fn resolve_url(base: &str, href: &str) -> Result<String, CollaboratorError> {
    let invalid = |e: url::ParseError| CollaboratorError::Extract {
        url: base.to_string(),
        message: format!("invalid link '{}': {}", href, e),
    };
    let base = Url::parse(base).map_err(invalid)?;
    base.join(href).map(String::from).map_err(invalid)
}

fn cancelled(url: &str) -> CollaboratorError {
    CollaboratorError::Cancelled {
        task: format!("GET {}", url),
    }
}
