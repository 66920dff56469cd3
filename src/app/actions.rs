use tracing::{debug, warn};

use crate::api::Outcome;
use crate::app::error::{NotifierError, Result};
use crate::app::AppContext;
use crate::cache::RefreshOutcome;
use crate::domain::FeedItem;
use crate::normalizer::Normalizer;
use crate::notifications::DispatchSettings;
use crate::presenter::NotificationHandle;

pub const FEEDLY_SITE: &str = "https://feedly.com";

/// A click on a per-entry notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationClick {
    pub handle: Option<NotificationHandle>,
    pub item_id: String,
    pub url: String,
}

/// What a click on the application icon led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconAction {
    OpenedSite,
    /// The entry list should be shown
    ShowFeeds,
    LoginRequired,
}

impl AppContext {
    /// Refetch unread entries. A silent refresh raises no notifications.
    pub async fn update_feeds(&self, silent: bool) -> Result<RefreshOutcome> {
        let options = self.options().await;
        let dispatch = (options.show_desktop_notifications && !silent)
            .then(|| DispatchSettings::from_options(&options));

        let outcome = self
            .cache
            .refresh(
                &options.feed_stream_ids(),
                options.max_number_of_feeds,
                Normalizer::new(options.show_full_feed_content),
                dispatch.as_ref(),
            )
            .await?;

        match outcome {
            RefreshOutcome::Updated { .. } => self.set_active_status(),
            RefreshOutcome::AuthRequired => self.handle_auth_required().await,
            RefreshOutcome::Superseded => {}
        }

        Ok(outcome)
    }

    /// Refetch unread counts and update the badge.
    pub async fn update_counter(&self) -> Result<Option<i64>> {
        let options = self.options().await;

        match self.counter.update(&options).await? {
            Outcome::Success(value) => {
                self.set_active_status();
                Ok(Some(value))
            }
            Outcome::AuthRequired => {
                self.handle_auth_required().await;
                Ok(None)
            }
        }
    }

    /// Refetch saved entries. Does nothing until the user id is known.
    pub async fn update_saved_feeds(&self) -> Result<bool> {
        let options = self.options().await;
        if options.feedly_user_id.is_empty() {
            debug!("No user id yet, skipping saved entries");
            return Ok(false);
        }

        let outcome = self
            .cache
            .refresh_saved(
                &options.streams().saved(),
                Normalizer::new(options.show_full_feed_content),
            )
            .await?;

        match outcome {
            Outcome::Success(_) => {
                self.set_active_status();
                Ok(true)
            }
            Outcome::AuthRequired => {
                self.handle_auth_required().await;
                Ok(false)
            }
        }
    }

    /// Cached unread entries, refreshed first when empty or `force`d.
    pub async fn get_feeds(&self, force: bool) -> Result<(Vec<FeedItem>, bool)> {
        let force = force || self.options.read().await.force_update_feeds;
        if force || self.cache.is_empty().await {
            self.update_feeds(true).await?;
        }
        Ok((self.cache.snapshot().await, self.is_logged_in()))
    }

    /// Cached saved entries, refreshed first when empty or `force`d.
    pub async fn get_saved_feeds(&self, force: bool) -> Result<(Vec<FeedItem>, bool)> {
        if !self.options.read().await.ability_save_feeds {
            return Err(NotifierError::Disabled("ability_save_feeds"));
        }
        if force || self.cache.saved_is_empty().await {
            self.update_saved_feeds().await?;
        }
        Ok((self.cache.saved_snapshot().await, self.is_logged_in()))
    }

    /// Mark entries read upstream, then drop them from the cache and the
    /// badge. Returns whether the user is still logged in.
    pub async fn mark_as_read(&self, ids: &[String]) -> Result<bool> {
        match self.feedly.mark_as_read(ids).await? {
            Outcome::Success(()) => {
                self.set_active_status();
                let removed = self.cache.remove(ids).await;
                debug!(requested = ids.len(), removed, "Marked as read");

                let show_counter = self.options.read().await.show_counter;
                self.counter.badge().decrement(ids.len(), show_counter);
                Ok(true)
            }
            Outcome::AuthRequired => {
                self.handle_auth_required().await;
                Ok(false)
            }
        }
    }

    /// Save an entry for later or unsave it.
    ///
    /// The cached flag is updated right away. Returns whether the user is
    /// still logged in.
    pub async fn toggle_saved(&self, id: &str, save: bool) -> Result<bool> {
        let options = self.options().await;
        if !options.ability_save_feeds {
            return Err(NotifierError::Disabled("ability_save_feeds"));
        }

        if !self.cache.set_saved(id, save).await {
            debug!(id, "Entry not cached, only updating upstream");
        }

        let tag = options.streams().saved();
        let outcome = if save {
            self.feedly.tag_entry(&tag, id).await?
        } else {
            self.feedly.untag_entry(&tag, id).await?
        };

        match outcome {
            Outcome::Success(()) => {
                self.set_active_status();
                Ok(true)
            }
            Outcome::AuthRequired => {
                self.handle_auth_required().await;
                Ok(false)
            }
        }
    }

    /// Open the entry behind a notification, marking it read if configured.
    pub async fn notification_clicked(&self, click: &NotificationClick) -> Result<()> {
        if let Some(handle) = click.handle {
            self.presenter.dismiss(handle);
        }

        self.presenter.open_url(&click.url)?;

        let mark_read = self.options.read().await.mark_read_on_click;
        if mark_read && !self.mark_as_read(std::slice::from_ref(&click.item_id)).await? {
            warn!(id = %click.item_id, "Entry opened but not marked read, login required");
        }
        Ok(())
    }

    pub async fn icon_clicked(&self) -> Result<IconAction> {
        if !self.is_logged_in() {
            return Ok(IconAction::LoginRequired);
        }

        if self.options.read().await.open_site_on_icon_click {
            self.presenter.open_url(FEEDLY_SITE)?;
            return Ok(IconAction::OpenedSite);
        }
        Ok(IconAction::ShowFeeds)
    }
}
