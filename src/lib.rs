//! # feedly-notifier
//!
//! Background poller for a Feedly account: keeps an unread counter on a
//! badge, caches the newest unread entries and raises desktop notifications
//! for entries crawled since the last check.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler → Feedly API → Normalizer → Cache → Notifications
//!                 ↓
//!          Counter → Badge
//! ```
//!
//! - [`api`]: Feedly client with OAuth header and auth failure detection
//! - [`normalizer`]: Converts raw stream entries into [`FeedItem`](domain::FeedItem)s
//! - [`cache`]: Merges streams, tracks the crawl watermark
//! - [`counter`]: Unread count computation and the badge
//! - [`notifications`]: Turns new entries into desktop notifications
//! - [`scheduler`]: Periodic refresh triggers
//!
//! ## Quick Start
//!
//! ```bash
//! # Start polling in the background
//! feedly-notifier daemon start --log ~/.cache/feedly-notifier.log
//!
//! # List unread entries
//! feedly-notifier feeds --force
//!
//! # Mark entries as read
//! feedly-notifier mark-read <entry id>...
//! ```

/// Application context, user actions and error handling.
///
/// [`AppContext`](app::AppContext) wires together the API client, the
/// cache, the counter, the presenter and the scheduler.
pub mod app;

/// Feedly cloud API.
///
/// - [`ApiClient`](api::ApiClient): Async trait for authenticated requests
/// - [`HttpApiClient`](api::HttpApiClient): reqwest-based implementation
/// - [`Feedly`](api::Feedly): Typed endpoints on top of a client
pub mod api;

/// Unread entry cache and new entry detection.
pub mod cache;

/// Command-line interface using clap.
///
/// - `daemon start|stop|status|reload` - Background poller
/// - `feeds [--force]` / `saved [--force]` - List entries
/// - `counter` - Refresh the unread counter
/// - `mark-read <ids>`, `save <id>`, `unsave <id>`, `open <id>`
pub mod cli;

/// User options.
///
/// Loads from `~/.config/feedly-notifier/config.toml`.
pub mod config;

/// Unread count and badge.
pub mod counter;

/// Background daemon.
///
/// - `feedly-notifier daemon start` - Start polling
/// - `feedly-notifier daemon stop` - Stop the daemon
/// - `feedly-notifier daemon reload` - Re-read the configuration
pub mod daemon;

/// Core domain models.
///
/// - [`FeedItem`](domain::FeedItem): A normalized entry
/// - [`UserStreams`](domain::UserStreams): Per-user stream ids
pub mod domain;

/// Entry normalization.
pub mod normalizer;

/// Notification planning and auto-hide.
pub mod notifications;

/// Desktop integration: notifications, badge, status icon, browser.
pub mod presenter;

/// Refresh triggers.
pub mod scheduler;

/// SQLite persistence for state that outlives the process.
pub mod store;
