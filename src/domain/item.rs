use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An unread entry as kept in the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Entry id assigned by Feedly, stable across fetches
    pub id: String,
    pub title: String,
    /// `"rtl"` or empty
    pub title_direction: String,
    pub content: String,
    pub content_direction: String,
    pub url: String,
    pub blog: String,
    /// Scheme and host of the origin site, `"#"` when unknown
    pub blog_url: String,
    pub blog_icon: String,
    /// Crawl time
    pub date: Option<DateTime<Utc>>,
    pub is_saved: bool,
}

impl FeedItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Crawl time as RFC 3339, empty when the entry has none.
    pub fn iso_date(&self) -> String {
        self.date
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default()
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_date_with_date() {
        let mut item = FeedItem::new("e1");
        item.date = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(item.iso_date(), "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_iso_date_without_date() {
        let item = FeedItem::new("e1");
        assert_eq!(item.iso_date(), "");
    }

    #[test]
    fn test_display_title_without_title() {
        let item = FeedItem::new("e1");
        assert_eq!(item.display_title(), "(Untitled)");
    }

    #[test]
    fn test_display_title_with_title() {
        let mut item = FeedItem::new("e1");
        item.title = "My Article".into();
        assert_eq!(item.display_title(), "My Article");
    }
}
