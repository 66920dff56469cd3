//! Cache of unread entries.
//!
//! A refresh fetches every stream concurrently, merges the batches and
//! replaces the cache in one step:
//!
//! ```text
//! streams → concat → dedup (last wins) → sort by date ↓ → truncate → cache
//!                                                            ↓
//!                                          watermark → new entries → notifications
//! ```
//!
//! Overlapping refreshes follow a supersede policy: every refresh takes a
//! generation number when it starts, and a refresh whose generation is not
//! newer than the last committed one drops its results.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::api::{Feedly, Outcome, StreamQuery};
use crate::app::Result;
use crate::domain::FeedItem;
use crate::normalizer::Normalizer;
use crate::notifications::{DispatchSettings, NotificationDispatcher};
use crate::store::Store;

/// Watermark used before anything has been classified.
pub static INITIAL_WATERMARK: LazyLock<DateTime<Utc>> = LazyLock::new(|| {
    Utc.with_ymd_and_hms(1971, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
});

/// Remove repeated ids, keeping the occurrence nearest the end.
pub fn dedup_keep_last(items: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut seen = HashSet::new();
    let mut kept: Vec<FeedItem> = items
        .into_iter()
        .rev()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();
    kept.reverse();
    kept
}

/// Concatenate batches, dedup, sort newest first (undated last, stable)
/// and keep at most `max_count` entries.
pub fn merge_batches(batches: Vec<Vec<FeedItem>>, max_count: usize) -> Vec<FeedItem> {
    let mut items = dedup_keep_last(batches.into_iter().flatten().collect());
    // `None` orders before `Some`, so undated entries end up last.
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(max_count);
    items
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub new_items: Vec<FeedItem>,
    pub watermark: DateTime<Utc>,
}

/// Split off the entries crawled after `watermark` and advance it.
pub fn classify(items: &[FeedItem], watermark: DateTime<Utc>) -> Classification {
    let new_items: Vec<FeedItem> = items
        .iter()
        .filter(|item| item.date.is_some_and(|date| date > watermark))
        .cloned()
        .collect();

    let newest = new_items.iter().filter_map(|item| item.date).max();

    Classification {
        watermark: newest.map_or(watermark, |date| date.max(watermark)),
        new_items,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated { cached: usize, new_items: usize },
    /// A stream needs a new access token; the cache is unchanged
    AuthRequired,
    /// A newer refresh committed first; results were dropped
    Superseded,
}

#[derive(Debug, Default)]
struct CacheState {
    feeds: Vec<FeedItem>,
    saved: Vec<FeedItem>,
    committed_generation: u64,
}

pub struct FeedCache {
    feedly: Feedly,
    store: Arc<dyn Store>,
    dispatcher: NotificationDispatcher,
    state: RwLock<CacheState>,
    generation: AtomicU64,
    /// Serializes cache replacement, watermark update and dispatch
    commit: Mutex<()>,
}

impl FeedCache {
    pub fn new(feedly: Feedly, store: Arc<dyn Store>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            feedly,
            store,
            dispatcher,
            state: RwLock::new(CacheState::default()),
            generation: AtomicU64::new(0),
            commit: Mutex::new(()),
        }
    }

    /// Refetch `stream_ids` and replace the cache.
    ///
    /// New entries go to the dispatcher when `dispatch` is set.
    pub async fn refresh(
        &self,
        stream_ids: &[String],
        max_count: usize,
        normalizer: Normalizer,
        dispatch: Option<&DispatchSettings>,
    ) -> Result<RefreshOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let query = StreamQuery::unread(max_count);
        let results = join_all(
            stream_ids
                .iter()
                .map(|stream_id| self.feedly.stream_contents(stream_id, query)),
        )
        .await;

        let mut batches = Vec::with_capacity(results.len());
        let mut failure = None;
        for (stream_id, result) in stream_ids.iter().zip(results) {
            match result {
                Ok(Outcome::Success(contents)) => {
                    batches.push(normalizer.normalize_stream(&contents));
                }
                Ok(Outcome::AuthRequired) => {
                    warn!(stream = %stream_id, "Refresh aborted, authorization required");
                    return Ok(RefreshOutcome::AuthRequired);
                }
                Err(e) => {
                    warn!(stream = %stream_id, error = %e, "Failed to fetch stream");
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let merged = merge_batches(batches, max_count);

        let _commit = self.commit.lock().await;
        let classification = {
            let mut state = self.state.write().await;
            if generation <= state.committed_generation {
                debug!(generation, "Refresh superseded, dropping results");
                return Ok(RefreshOutcome::Superseded);
            }

            // A failing store leaves the previous cache in place.
            let watermark = self.store.last_feed_time()?.unwrap_or(*INITIAL_WATERMARK);
            let classification = classify(&merged, watermark);
            if classification.watermark > watermark {
                self.store.set_last_feed_time(classification.watermark)?;
            }

            state.committed_generation = generation;
            state.feeds = merged.clone();
            classification
        };

        info!(
            streams = stream_ids.len(),
            cached = merged.len(),
            new = classification.new_items.len(),
            "Feeds refreshed"
        );

        if let Some(settings) = dispatch {
            if !classification.new_items.is_empty() {
                self.dispatcher.dispatch(&classification.new_items, settings);
            }
        }

        Ok(RefreshOutcome::Updated {
            cached: merged.len(),
            new_items: classification.new_items.len(),
        })
    }

    /// Replace the saved entries with the contents of `stream_id`.
    pub async fn refresh_saved(
        &self,
        stream_id: &str,
        normalizer: Normalizer,
    ) -> Result<Outcome<usize>> {
        let outcome = self
            .feedly
            .stream_contents(stream_id, StreamQuery::default())
            .await?;

        Ok(match outcome {
            Outcome::Success(contents) => {
                let saved = normalizer.normalize_stream(&contents);
                let count = saved.len();
                self.state.write().await.saved = saved;
                Outcome::Success(count)
            }
            Outcome::AuthRequired => Outcome::AuthRequired,
        })
    }

    pub async fn snapshot(&self) -> Vec<FeedItem> {
        self.state.read().await.feeds.clone()
    }

    pub async fn saved_snapshot(&self) -> Vec<FeedItem> {
        self.state.read().await.saved.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.feeds.is_empty()
    }

    pub async fn saved_is_empty(&self) -> bool {
        self.state.read().await.saved.is_empty()
    }

    /// Drop read entries, returns how many were cached.
    pub async fn remove(&self, ids: &[String]) -> usize {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut state = self.state.write().await;
        let before = state.feeds.len();
        state.feeds.retain(|item| !ids.contains(item.id.as_str()));
        before - state.feeds.len()
    }

    /// Update the saved flag of a cached entry, returns whether it was found.
    pub async fn set_saved(&self, id: &str, saved: bool) -> bool {
        let mut state = self.state.write().await;
        match state.feeds.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.is_saved = saved;
                true
            }
            None => false,
        }
    }

    /// Empty both caches; refreshes already in flight are dropped.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.feeds.clear();
        state.saved.clear();
        state.committed_generation = self.generation.load(Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(minutes: i64) -> Option<DateTime<Utc>> {
        Some(*INITIAL_WATERMARK + Duration::days(20_000) + Duration::minutes(minutes))
    }

    fn item(id: &str, date: Option<DateTime<Utc>>) -> FeedItem {
        FeedItem {
            id: id.into(),
            date,
            ..FeedItem::default()
        }
    }

    fn ids(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_dedup_keeps_last_occurrence() {
        let items = vec![
            item("a", at(1)),
            item("b", at(2)),
            item("a", at(3)),
            item("c", at(4)),
            item("b", at(5)),
        ];

        let deduped = dedup_keep_last(items);
        assert_eq!(ids(&deduped), vec!["a", "c", "b"]);
        assert_eq!(deduped[0].date, at(3));
        assert_eq!(deduped[2].date, at(5));
    }

    #[test]
    fn test_merge_example() {
        let batches = vec![
            vec![item("a", at(1)), item("b", at(2))],
            vec![item("a", at(3))],
        ];

        let merged = merge_batches(batches, 10);
        assert_eq!(merged, vec![item("a", at(3)), item("b", at(2))]);
    }

    #[test]
    fn test_merge_puts_undated_last_in_original_order() {
        let batches = vec![vec![
            item("u1", None),
            item("old", at(1)),
            item("u2", None),
            item("new", at(9)),
            item("u3", None),
        ]];

        let merged = merge_batches(batches, 10);
        assert_eq!(ids(&merged), vec!["new", "old", "u1", "u2", "u3"]);
    }

    #[test]
    fn test_merge_equal_dates_keep_relative_order() {
        let batches = vec![vec![item("x", at(5)), item("y", at(5)), item("z", at(5))]];
        assert_eq!(ids(&merge_batches(batches, 10)), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_merge_truncates_to_max_count() {
        let batch: Vec<_> = (0..30).map(|i| item(&format!("e{}", i), at(i))).collect();

        let merged = merge_batches(vec![batch], 20);
        assert_eq!(merged.len(), 20);
        assert_eq!(merged[0].id, "e29");
        assert_eq!(merged[19].id, "e10");
    }

    #[test]
    fn test_classify_against_watermark() {
        let watermark = at(5).unwrap();
        let items = vec![item("c", at(7)), item("b", at(5)), item("a", at(3)), item("u", None)];

        let classification = classify(&items, watermark);
        assert_eq!(ids(&classification.new_items), vec!["c"]);
        assert_eq!(classification.watermark, at(7).unwrap());
    }

    #[test]
    fn test_classify_nothing_new_keeps_watermark() {
        let watermark = at(10).unwrap();
        let items = vec![item("a", at(10)), item("b", at(2)), item("u", None)];

        let classification = classify(&items, watermark);
        assert!(classification.new_items.is_empty());
        assert_eq!(classification.watermark, watermark);
    }

    #[test]
    fn test_initial_watermark() {
        assert_eq!(INITIAL_WATERMARK.to_rfc3339(), "1971-01-01T00:00:00+00:00");
    }
}
