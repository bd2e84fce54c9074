//! Ordered batch orchestration over the chapter fetcher.
//!
//! `fetch_all` keeps a strict positional contract: output[i] is the result
//! for input chapter i, with placeholders standing in for anything that
//! failed or missed the wall-clock ceiling. One strategy per configuration:
//! fully sequential with a politeness delay (`batch_size = 1`), or bounded
//! contiguous groups fetched concurrently.

use super::{ChapterInfo, NormalizedChapter, StoryBundle, StoryInfo, WattpadClient, rate_limit};
use futures::future::join_all;
use std::time::Duration;
use tokio::time::Instant;

/// Placeholder reason for chapters cut off by the batch deadline.
const DEADLINE_REASON: &str = "batch deadline exceeded";

impl WattpadClient {
    /// Fetches every chapter, preserving input order and length.
    ///
    /// Individual failures surface as placeholder chapters, never as a
    /// shorter output. When `scraping.overall_deadline_sec` is set,
    /// chapters that do not finish inside the ceiling become placeholders
    /// as well.
    pub async fn fetch_all(&self, chapters: &[ChapterInfo]) -> Vec<NormalizedChapter> {
        let deadline = match self.config().overall_deadline_sec {
            secs if secs > 0.0 => Some(Instant::now() + Duration::from_secs_f64(secs)),
            _ => None,
        };

        if self.config().batch_size <= 1 {
            self.fetch_sequential(chapters, deadline).await
        } else {
            self.fetch_grouped(chapters, deadline).await
        }
    }

    /// Fetches the whole story: metadata already in hand, chapters batched.
    pub async fn fetch_bundle(&self, info: StoryInfo) -> StoryBundle {
        let chapters = self.fetch_all(&info.parts).await;
        StoryBundle { info, chapters }
    }

    /// One chapter at a time, politeness delay in between.
    async fn fetch_sequential(
        &self,
        chapters: &[ChapterInfo],
        deadline: Option<Instant>,
    ) -> Vec<NormalizedChapter> {
        let mut results = Vec::with_capacity(chapters.len());

        for (idx, chapter) in chapters.iter().enumerate() {
            if deadline_passed(deadline) {
                results.push(NormalizedChapter::unavailable(&chapter.title, DEADLINE_REASON));
                continue;
            }

            if idx > 0 {
                rate_limit(self.config().delay_between_requests_sec).await;
            }
            results.push(self.fetch_chapter(chapter).await);
        }

        results
    }

    /// Contiguous groups of `batch_size`, each group fetched concurrently
    /// and awaited in full before the next one starts. `join_all` returns
    /// results in input order, so positions are preserved for free.
    async fn fetch_grouped(
        &self,
        chapters: &[ChapterInfo],
        deadline: Option<Instant>,
    ) -> Vec<NormalizedChapter> {
        let mut results = Vec::with_capacity(chapters.len());

        for (group_idx, group) in chapters.chunks(self.config().batch_size).enumerate() {
            if deadline_passed(deadline) {
                results.extend(group.iter().map(|chapter| {
                    NormalizedChapter::unavailable(&chapter.title, DEADLINE_REASON)
                }));
                continue;
            }

            if group_idx > 0 {
                rate_limit(self.config().delay_between_requests_sec).await;
            }

            let fetches = join_all(group.iter().map(|chapter| self.fetch_chapter(chapter)));
            match deadline {
                Some(at) => match tokio::time::timeout_at(at, fetches).await {
                    Ok(group_results) => results.extend(group_results),
                    Err(_) => {
                        tracing::warn!(
                            remaining = chapters.len() - results.len(),
                            "batch deadline hit mid-group"
                        );
                        results.extend(group.iter().map(|chapter| {
                            NormalizedChapter::unavailable(&chapter.title, DEADLINE_REASON)
                        }));
                    }
                },
                None => results.extend(fetches.await),
            }
        }

        results
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|at| Instant::now() >= at)
}
