//! Presentation layer: desktop notifications, the badge, the status icon
//! and the browser.
//!
//! [`LogPresenter`] reports everything through `tracing` and opens URLs
//! with the system browser. Desktop integrations implement [`Presenter`].

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::app::Result;

/// A desktop notification ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub icon: String,
    pub title: String,
    pub body: String,
    /// Entry behind a per-entry notification
    pub item_id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationHandle(pub u64);

/// Login status shown by the application icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Inactive,
}

pub trait Presenter: Send + Sync {
    fn show(&self, notification: &Notification) -> Result<NotificationHandle>;
    fn dismiss(&self, handle: NotificationHandle);
    /// Empty text hides the badge
    fn set_badge_text(&self, text: &str);
    fn set_status(&self, status: Status);
    fn open_url(&self, url: &str) -> Result<()>;
}

#[derive(Default)]
pub struct LogPresenter {
    next_handle: AtomicU64,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for LogPresenter {
    fn show(&self, notification: &Notification) -> Result<NotificationHandle> {
        let handle = NotificationHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        info!(
            handle = handle.0,
            title = %notification.title,
            body = %notification.body,
            url = notification.url.as_deref().unwrap_or(""),
            "Notification"
        );
        Ok(handle)
    }

    fn dismiss(&self, handle: NotificationHandle) {
        tracing::debug!(handle = handle.0, "Notification dismissed");
    }

    fn set_badge_text(&self, text: &str) {
        info!(badge = text, "Badge updated");
    }

    fn set_status(&self, status: Status) {
        info!(?status, "Status changed");
    }

    fn open_url(&self, url: &str) -> Result<()> {
        info!(url, "Opening in browser");
        open::that(url)?;
        Ok(())
    }
}
