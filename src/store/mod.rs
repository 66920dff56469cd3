pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;

pub use sqlite::SqliteStore;

/// Key of the newest crawl time already classified.
pub const LAST_FEED_TIME_KEY: &str = "last_feed_time_ticks";

/// Local state that outlives the process.
pub trait Store: Send + Sync {
    fn get_value(&self, key: &str) -> Result<Option<String>>;
    fn set_value(&self, key: &str, value: &str) -> Result<()>;

    /// Watermark between seen and new entries.
    fn last_feed_time(&self) -> Result<Option<DateTime<Utc>>> {
        let ticks = self
            .get_value(LAST_FEED_TIME_KEY)?
            .and_then(|v| v.parse::<i64>().ok());
        Ok(ticks.and_then(DateTime::from_timestamp_millis))
    }

    fn set_last_feed_time(&self, time: DateTime<Utc>) -> Result<()> {
        self.set_value(LAST_FEED_TIME_KEY, &time.timestamp_millis().to_string())
    }
}
