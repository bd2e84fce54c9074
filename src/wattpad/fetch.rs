//! Session-gated chapter retrieval.
//!
//! `fetch_chapter` never fails: every terminal error becomes placeholder
//! chapter text, so one bad chapter can never abort a whole download. The
//! raw response body is inspected for the host's denial sentinel before any
//! parsing; a sentinel hit invalidates the shared session as a documented
//! side effect, which concurrently in-flight fetches observe on their next
//! `acquire`.

use super::{ChapterInfo, NormalizedChapter, WattpadClient, rate_limit};
use crate::error::FetchError;
use crate::normalize::normalize;
use reqwest::header::COOKIE;

/// Exact body the host returns for a chapter-text request without a valid
/// visitor session. Matched byte-for-byte; no case or whitespace variants.
pub const DENIAL_SENTINEL: &str = "Array";

impl WattpadClient {
    /// Fetches and normalizes one chapter.
    ///
    /// Retries up to `scraping.max_attempts` times. A denial sentinel costs
    /// an attempt and triggers invalidate + re-acquire with no backoff;
    /// transport failures back off linearly before the next attempt. When
    /// the attempts run out the chapter degrades to an unavailability
    /// placeholder embedding the last failure.
    pub async fn fetch_chapter(&self, chapter: &ChapterInfo) -> NormalizedChapter {
        let max_attempts = self.config().max_attempts.max(1);
        let url = format!(
            "{}/apiv2/?m=storytext&id={}",
            self.api_base(),
            chapter.id
        );

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            let credential = self.session().acquire().await;

            let mut request = self.http().get(&url);
            if !credential.is_empty() {
                request = request.header(COOKIE, credential);
            }

            let raw = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    match response.text().await {
                        Ok(body) => body,
                        Err(err) => {
                            last_error = FetchError::Http(err).to_string();
                            self.retry_backoff(attempt, max_attempts).await;
                            continue;
                        }
                    }
                }
                Ok(response) => {
                    last_error = FetchError::Status(response.status()).to_string();
                    self.retry_backoff(attempt, max_attempts).await;
                    continue;
                }
                Err(err) => {
                    last_error = FetchError::Http(err).to_string();
                    self.retry_backoff(attempt, max_attempts).await;
                    continue;
                }
            };

            // Sentinel check happens on the raw body, before any parsing.
            if raw == DENIAL_SENTINEL {
                tracing::debug!(chapter = chapter.number, attempt, "denial sentinel, re-acquiring session");
                self.session().invalidate().await;
                last_error = FetchError::AccessDenied.to_string();
                continue;
            }

            let body = normalize(&raw);
            if body.is_empty() {
                tracing::debug!(chapter = chapter.number, "chapter normalized to empty text");
                return NormalizedChapter::empty_content(&chapter.title);
            }

            return NormalizedChapter {
                title: chapter.title.clone(),
                body,
            };
        }

        let reason = FetchError::AttemptsExhausted {
            attempts: max_attempts,
            last: last_error,
        }
        .to_string();
        tracing::warn!(chapter = chapter.number, %reason, "chapter unavailable");
        NormalizedChapter::unavailable(&chapter.title, &reason)
    }

    /// Sleeps the linear backoff before the next attempt, if one remains.
    async fn retry_backoff(&self, attempt: u32, max_attempts: u32) {
        if attempt < max_attempts {
            rate_limit(self.config().retry_backoff_sec * attempt as f64).await;
        }
    }
}
