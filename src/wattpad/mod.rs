//! Wattpad client: story metadata, session-gated chapter text, batching.
//!
//! The host serves chapter text only to requests carrying its visitor-session
//! cookies; [`crate::session::SessionManager`] owns that credential. This
//! module defines the shared data types and the client the CLI and server
//! drive. Metadata retrieval lives in `story`, the per-chapter fetch loop in
//! `fetch`, and the ordered batch orchestration in `batch`.

mod batch;
mod fetch;
mod story;

pub use fetch::DENIAL_SENTINEL;
pub use story::parse_story_id;

use crate::config::ScrapingConfig;
use crate::error::FetchError;
use crate::session::SessionManager;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Marker prefix for chapter bodies that could not be retrieved.
pub const UNAVAILABLE_MARKER: &str = "[CONTENT UNAVAILABLE]";

/// Story metadata as retrieved from the host.
#[derive(Debug, Clone, Serialize)]
pub struct StoryInfo {
    /// Numeric story identifier.
    pub id: u64,

    /// Story title.
    pub title: String,

    /// Author display name.
    pub author: String,

    /// Story description (may be empty).
    pub description: String,

    /// Ordered chapter descriptors.
    pub parts: Vec<ChapterInfo>,
}

/// Descriptor for a single chapter.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterInfo {
    /// Chapter number (1-based, dense, in source order).
    pub number: u32,

    /// Identifier used to fetch the chapter text.
    pub id: u64,

    /// Chapter title.
    pub title: String,

    /// Byte-length hint reported by the host, when present.
    pub length: Option<u64>,
}

/// A chapter after normalization: plain text, paragraphs separated by one
/// blank line. The body is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedChapter {
    /// Chapter title.
    pub title: String,

    /// Plain-text body, or a placeholder when no text could be retrieved.
    pub body: String,
}

impl NormalizedChapter {
    /// Placeholder for a chapter whose retrieval failed terminally. The
    /// assembler renders this like any other body, so the document stays
    /// structurally complete.
    pub fn unavailable(title: &str, reason: &str) -> Self {
        Self {
            title: title.to_string(),
            body: format!("{UNAVAILABLE_MARKER}\nThis chapter could not be retrieved: {reason}"),
        }
    }

    /// Placeholder for a chapter the host returned with no readable text.
    pub fn empty_content(title: &str) -> Self {
        Self {
            title: title.to_string(),
            body: "(This chapter has no readable text.)".to_string(),
        }
    }

    /// True when the body is the terminal-failure placeholder.
    pub fn is_unavailable(&self) -> bool {
        self.body.starts_with(UNAVAILABLE_MARKER)
    }
}

/// Everything the document assembler needs, built once per request.
#[derive(Debug, Clone)]
pub struct StoryBundle {
    /// Story metadata.
    pub info: StoryInfo,

    /// Normalized chapters, in reading order.
    pub chapters: Vec<NormalizedChapter>,
}

/// Client for the content host.
///
/// Holds the HTTP client, the download configuration and the shared session
/// manager. Cheap to share by reference; `fetch_all` runs concurrent
/// fetches through `&self`.
pub struct WattpadClient {
    client: reqwest::Client,
    session: SessionManager,
    config: ScrapingConfig,
}

impl WattpadClient {
    /// Creates a client from the scraping configuration.
    pub fn new(config: ScrapingConfig) -> Result<Self, FetchError> {
        let landing = Url::parse(&config.api_base)
            .map_err(|_| FetchError::InvalidUrl(config.api_base.clone()))?;
        let client = create_http_client(&config)?;
        let session = SessionManager::new(client.clone(), landing);

        Ok(Self {
            client,
            session,
            config,
        })
    }

    /// The session manager owning the visitor credential.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Base URL of the host without a trailing slash.
    pub(crate) fn api_base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn config(&self) -> &ScrapingConfig {
        &self.config
    }
}

/// Common HTTP client configuration.
pub fn create_http_client(config: &ScrapingConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_sec))
        .build()
}

/// Applies the politeness delay between requests.
pub async fn rate_limit(delay_sec: f64) {
    if delay_sec > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(delay_sec)).await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Scraping config pointed at a mock server, with delays zeroed so
    /// tests run fast.
    pub fn test_config(base: &str) -> ScrapingConfig {
        ScrapingConfig {
            api_base: base.to_string(),
            retry_backoff_sec: 0.0,
            delay_between_requests_sec: 0.0,
            ..ScrapingConfig::default()
        }
    }

    pub fn chapter(number: u32, id: u64, title: &str) -> ChapterInfo {
        ChapterInfo {
            number,
            id,
            title: title.to_string(),
            length: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_placeholder_embeds_reason() {
        let chapter = NormalizedChapter::unavailable("Ch 3", "timed out");
        assert!(chapter.body.starts_with(UNAVAILABLE_MARKER));
        assert!(chapter.body.contains("timed out"));
        assert!(chapter.is_unavailable());
    }

    #[test]
    fn test_empty_content_placeholder_is_not_empty() {
        let chapter = NormalizedChapter::empty_content("Ch 1");
        assert!(!chapter.body.is_empty());
        assert!(!chapter.is_unavailable());
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        let config = ScrapingConfig {
            api_base: "not a url".to_string(),
            ..ScrapingConfig::default()
        };
        assert!(WattpadClient::new(config).is_err());
    }
}
