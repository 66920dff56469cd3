use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Options;
use crate::domain::FeedItem;
use crate::presenter::{Notification, NotificationHandle, Presenter};

pub const APP_ICON: &str = "images/icon128.png";

/// How a batch of new entries is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Above this many entries only a summary notification is shown
    pub max_notifications: usize,
    /// Number of entries a refresh can fetch at most
    pub fetch_cap: usize,
    /// Zero keeps notifications until dismissed by the user
    pub hide_delay: Duration,
}

impl DispatchSettings {
    pub fn from_options(options: &Options) -> Self {
        Self {
            max_notifications: options.max_notifications_count,
            fetch_cap: options.max_number_of_feeds,
            hide_delay: Duration::from_secs(options.hide_notification_delay),
        }
    }
}

/// Notifications to raise for `items`.
pub fn plan(items: &[FeedItem], settings: &DispatchSettings) -> Vec<Notification> {
    if items.is_empty() {
        return Vec::new();
    }

    if items.len() > settings.max_notifications {
        // Only the first `fetch_cap` entries were fetched, there may be more.
        let count = if items.len() == settings.fetch_cap {
            "many".to_string()
        } else {
            items.len().to_string()
        };

        return vec![Notification {
            icon: APP_ICON.to_string(),
            title: "New feeds".to_string(),
            body: format!("You have {} new feeds", count),
            item_id: None,
            url: None,
        }];
    }

    items
        .iter()
        .map(|item| Notification {
            icon: item.blog_icon.clone(),
            title: item.blog.clone(),
            body: item.title.clone(),
            item_id: Some(item.id.clone()),
            url: Some(item.url.clone()),
        })
        .collect()
}

pub struct NotificationDispatcher {
    presenter: Arc<dyn Presenter>,
}

impl NotificationDispatcher {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self { presenter }
    }

    /// Show notifications for new entries and arm one shared auto-hide
    /// timer for the whole batch.
    pub fn dispatch(&self, items: &[FeedItem], settings: &DispatchSettings) -> Vec<NotificationHandle> {
        let handles: Vec<_> = plan(items, settings)
            .iter()
            .filter_map(|notification| match self.presenter.show(notification) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(error = %e, "Failed to show notification");
                    None
                }
            })
            .collect();

        debug!(entries = items.len(), shown = handles.len(), "Dispatched notifications");

        if !handles.is_empty() && !settings.hide_delay.is_zero() {
            let presenter = self.presenter.clone();
            let to_hide = handles.clone();
            let delay = settings.hide_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                for handle in to_hide {
                    presenter.dismiss(handle);
                }
            });
        }

        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<FeedItem> {
        (0..n)
            .map(|i| FeedItem {
                id: format!("entry-{}", i),
                title: format!("Title {}", i),
                blog: "Blog".into(),
                blog_icon: "icon".into(),
                url: format!("https://example.com/{}", i),
                ..FeedItem::default()
            })
            .collect()
    }

    fn settings() -> DispatchSettings {
        DispatchSettings {
            max_notifications: 5,
            fetch_cap: 20,
            hide_delay: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_nothing_new_nothing_shown() {
        assert!(plan(&[], &settings()).is_empty());
    }

    #[test]
    fn test_one_notification_per_entry_up_to_threshold() {
        let planned = plan(&items(5), &settings());

        assert_eq!(planned.len(), 5);
        assert_eq!(planned[2].title, "Blog");
        assert_eq!(planned[2].body, "Title 2");
        assert_eq!(planned[2].item_id.as_deref(), Some("entry-2"));
        assert_eq!(planned[2].url.as_deref(), Some("https://example.com/2"));
    }

    #[test]
    fn test_summary_above_threshold() {
        let planned = plan(&items(6), &settings());

        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].body, "You have 6 new feeds");
        assert_eq!(planned[0].item_id, None);
    }

    #[test]
    fn test_summary_says_many_at_fetch_cap() {
        let planned = plan(&items(20), &settings());
        assert_eq!(planned[0].body, "You have many new feeds");
    }

    #[test]
    fn test_settings_from_options() {
        let options = Options {
            max_notifications_count: 3,
            max_number_of_feeds: 50,
            hide_notification_delay: 0,
            ..Options::default()
        };

        let settings = DispatchSettings::from_options(&options);
        assert_eq!(settings.max_notifications, 3);
        assert_eq!(settings.fetch_cap, 50);
        assert!(settings.hide_delay.is_zero());
    }

    #[derive(Default)]
    struct Recorder {
        next: std::sync::atomic::AtomicU64,
        dismissed: std::sync::Mutex<Vec<NotificationHandle>>,
    }

    impl Presenter for Recorder {
        fn show(&self, _: &Notification) -> crate::app::Result<NotificationHandle> {
            let id = self.next.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(NotificationHandle(id))
        }

        fn dismiss(&self, handle: NotificationHandle) {
            self.dismissed.lock().unwrap().push(handle);
        }

        fn set_badge_text(&self, _: &str) {}

        fn set_status(&self, _: crate::presenter::Status) {}

        fn open_url(&self, _: &str) -> crate::app::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_is_hidden_together_after_delay() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = NotificationDispatcher::new(recorder.clone());

        let handles = dispatcher.dispatch(&items(3), &settings());
        assert_eq!(
            handles,
            vec![NotificationHandle(0), NotificationHandle(1), NotificationHandle(2)]
        );

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(recorder.dismissed.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*recorder.dismissed.lock().unwrap(), handles);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_keeps_notifications() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = NotificationDispatcher::new(recorder.clone());
        let settings = DispatchSettings {
            hide_delay: Duration::ZERO,
            ..settings()
        };

        let handles = dispatcher.dispatch(&items(2), &settings);
        assert_eq!(handles.len(), 2);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(recorder.dismissed.lock().unwrap().is_empty());
    }
}
