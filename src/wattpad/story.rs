//! Story metadata retrieval.
//!
//! Resolves a story URL or bare numeric id into [`StoryInfo`] via the host's
//! v3 story API. Metadata is not session-gated, so no credential is attached
//! here.

use super::{ChapterInfo, StoryInfo, WattpadClient};
use crate::error::FetchError;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::LazyLock;

/// Fields requested from the story API.
const STORY_FIELDS: &str = "id,title,description,user(name,fullname),parts(id,title,length)";

/// Regex for story URLs like `https://www.wattpad.com/story/12345-some-slug`.
static STORY_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://(?:www\.)?wattpad\.com/story/(\d+)").unwrap());

/// Regex for bare numeric story ids.
static STORY_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

/// Story payload from the v3 API.
#[derive(Debug, Deserialize)]
struct StoryResponse {
    title: String,
    #[serde(default)]
    description: String,
    user: UserResponse,
    #[serde(default)]
    parts: Vec<PartResponse>,
}

/// Author reference inside a story payload.
#[derive(Debug, Deserialize)]
struct UserResponse {
    name: String,
    #[serde(default)]
    fullname: Option<String>,
}

/// One chapter entry inside a story payload.
#[derive(Debug, Deserialize)]
struct PartResponse {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    length: Option<u64>,
}

/// Extracts the numeric story id from a story URL or a bare id.
///
/// Chapter-level URLs are rejected: resolving them to their story would need
/// an extra round-trip this tool does not make.
pub fn parse_story_id(target: &str) -> Result<u64, FetchError> {
    let target = target.trim();

    let digits = if let Some(caps) = STORY_URL_PATTERN.captures(target) {
        caps[1].to_string()
    } else if STORY_ID_PATTERN.is_match(target) {
        target.to_string()
    } else {
        return Err(FetchError::InvalidUrl(target.to_string()));
    };

    digits
        .parse::<u64>()
        .map_err(|_| FetchError::InvalidUrl(target.to_string()))
}

impl WattpadClient {
    /// Fetches story metadata for a story URL or numeric id.
    pub async fn story(&self, target: &str) -> Result<StoryInfo, FetchError> {
        let id = parse_story_id(target)?;
        let url = format!(
            "{}/api/v3/stories/{}?fields={}",
            self.api_base(),
            id,
            STORY_FIELDS
        );

        let response = self.http().get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound(format!("story {id}")));
            }
            status if !status.is_success() => {
                return Err(FetchError::Status(status));
            }
            _ => {}
        }

        let body: StoryResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let author = body
            .user
            .fullname
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(body.user.name);

        // Renumber densely; the host's own ordering is authoritative.
        let parts = body
            .parts
            .into_iter()
            .enumerate()
            .map(|(idx, part)| {
                let number = (idx + 1) as u32;
                let title = part
                    .title
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("Chapter {number}"));
                ChapterInfo {
                    number,
                    id: part.id,
                    title,
                    length: part.length,
                }
            })
            .collect();

        Ok(StoryInfo {
            id,
            title: body.title,
            author,
            description: body.description,
            parts,
        })
    }
}
