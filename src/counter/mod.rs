//! Unread counter badge.
//!
//! With category filters enabled, the counts of the filtered categories are
//! summed. A subscription listed under several filtered categories is
//! counted once per category, so the surplus is subtracted again.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::api::types::{Subscription, UnreadCount};
use crate::api::{Feedly, Outcome};
use crate::app::Result;
use crate::config::Options;
use crate::presenter::Presenter;

/// Which unread counts make up the badge.
#[derive(Debug, Clone, Copy)]
pub enum CountMode<'a> {
    /// The count of the user's global category
    Total { global_group: &'a str },
    /// The counts of the listed categories
    Filtered { filters: &'a [String] },
}

pub fn compute_unread_count(
    counts: &[UnreadCount],
    subscriptions: &[Subscription],
    mode: CountMode<'_>,
) -> i64 {
    match mode {
        CountMode::Total { global_group } => counts
            .iter()
            .find(|c| c.id == global_group)
            .map(|c| c.count)
            .unwrap_or(0),
        CountMode::Filtered { filters } => {
            let filters: HashSet<&str> = filters.iter().map(String::as_str).collect();

            let sum: i64 = counts
                .iter()
                .filter(|c| filters.contains(c.id.as_str()))
                .map(|c| c.count)
                .sum();

            let surplus: i64 = subscriptions
                .iter()
                .filter_map(|subscription| {
                    let in_filters = subscription
                        .categories
                        .iter()
                        .filter(|category| filters.contains(category.id.as_str()))
                        .count() as i64;
                    if in_filters < 2 {
                        return None;
                    }
                    counts
                        .iter()
                        .find(|c| c.id == subscription.id)
                        .map(|c| c.count * (in_filters - 1))
                })
                .sum();

            sum - surplus
        }
    }
}

/// Text shown on the badge; empty hides it.
pub fn badge_text(value: i64, show_counter: bool) -> String {
    if show_counter && value > 0 {
        value.to_string()
    } else {
        String::new()
    }
}

/// Badge state mirrored to the presenter.
pub struct Badge {
    /// Value currently displayed, 0 when the badge is blank
    shown: AtomicI64,
    presenter: Arc<dyn Presenter>,
}

impl Badge {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            shown: AtomicI64::new(0),
            presenter,
        }
    }

    pub fn shown(&self) -> i64 {
        self.shown.load(Ordering::SeqCst)
    }

    pub fn set(&self, value: i64, show_counter: bool) {
        let text = badge_text(value, show_counter);
        let shown = if text.is_empty() { 0 } else { value };
        self.shown.store(shown, Ordering::SeqCst);
        self.presenter.set_badge_text(&text);
    }

    /// Lower a visible count after entries were read elsewhere.
    pub fn decrement(&self, by: usize, show_counter: bool) {
        let current = self.shown();
        if current > 0 {
            self.set(current - by as i64, show_counter);
        }
    }

    pub fn clear(&self) {
        self.shown.store(0, Ordering::SeqCst);
        self.presenter.set_badge_text("");
    }
}

pub struct CounterEngine {
    feedly: Feedly,
    badge: Badge,
}

impl CounterEngine {
    pub fn new(feedly: Feedly, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            feedly,
            badge: Badge::new(presenter),
        }
    }

    pub fn badge(&self) -> &Badge {
        &self.badge
    }

    /// Fetch unread counts and publish the badge.
    pub async fn update(&self, options: &Options) -> Result<Outcome<i64>> {
        let counts = match self.feedly.unread_counts().await? {
            Outcome::Success(counts) => counts,
            Outcome::AuthRequired => return Ok(Outcome::AuthRequired),
        };

        let value = if options.filters_active() {
            let subscriptions = match self.feedly.subscriptions().await? {
                Outcome::Success(subscriptions) => subscriptions,
                Outcome::AuthRequired => return Ok(Outcome::AuthRequired),
            };
            compute_unread_count(
                &counts,
                &subscriptions,
                CountMode::Filtered {
                    filters: &options.filters,
                },
            )
        } else {
            let global_group = options.streams().global_all();
            compute_unread_count(
                &counts,
                &[],
                CountMode::Total {
                    global_group: &global_group,
                },
            )
        };

        debug!(unread = value, "Unread counter computed");
        self.badge.set(value, options.show_counter);
        Ok(Outcome::Success(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Category;

    fn count(id: &str, count: i64) -> UnreadCount {
        UnreadCount {
            id: id.into(),
            count,
        }
    }

    fn subscription(id: &str, categories: &[&str]) -> Subscription {
        Subscription {
            id: id.into(),
            title: None,
            categories: categories
                .iter()
                .map(|c| Category {
                    id: c.to_string(),
                    label: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_total_uses_global_group() {
        let counts = vec![
            count("user/1/category/tech", 4),
            count("user/1/category/global.all", 17),
        ];
        let value = compute_unread_count(
            &counts,
            &[],
            CountMode::Total {
                global_group: "user/1/category/global.all",
            },
        );
        assert_eq!(value, 17);
    }

    #[test]
    fn test_total_without_global_group_is_zero() {
        let counts = vec![count("user/1/category/tech", 4)];
        let value = compute_unread_count(
            &counts,
            &[],
            CountMode::Total {
                global_group: "user/1/category/global.all",
            },
        );
        assert_eq!(value, 0);
    }

    #[test]
    fn test_filtered_subscription_in_two_of_three_categories_counts_once() {
        let filters: Vec<String> = vec!["cat/a".into(), "cat/b".into(), "cat/c".into()];
        // feed/x (5 unread) is in a and b, feed/y (2 unread) only in c.
        let counts = vec![
            count("cat/a", 5),
            count("cat/b", 5),
            count("cat/c", 2),
            count("feed/x", 5),
            count("feed/y", 2),
            count("cat/unfiltered", 100),
        ];
        let subscriptions = vec![
            subscription("feed/x", &["cat/a", "cat/b"]),
            subscription("feed/y", &["cat/c", "cat/unfiltered"]),
        ];

        let value = compute_unread_count(
            &counts,
            &subscriptions,
            CountMode::Filtered { filters: &filters },
        );
        assert_eq!(value, 7);
    }

    #[test]
    fn test_filtered_subscription_in_three_categories() {
        let filters: Vec<String> = vec!["cat/a".into(), "cat/b".into(), "cat/c".into()];
        let counts = vec![
            count("cat/a", 3),
            count("cat/b", 3),
            count("cat/c", 3),
            count("feed/x", 3),
        ];
        let subscriptions = vec![subscription("feed/x", &["cat/a", "cat/b", "cat/c"])];

        let value = compute_unread_count(
            &counts,
            &subscriptions,
            CountMode::Filtered { filters: &filters },
        );
        assert_eq!(value, 3);
    }

    #[test]
    fn test_badge_text() {
        assert_eq!(badge_text(12, true), "12");
        assert_eq!(badge_text(0, true), "");
        assert_eq!(badge_text(-3, true), "");
        assert_eq!(badge_text(12, false), "");
    }
}
