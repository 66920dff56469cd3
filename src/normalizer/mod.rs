use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

use crate::api::types::{RawContent, RawEntry, StreamContents};
use crate::domain::FeedItem;

/// Scheme and host at the start of a site URL.
static SITE_ROOT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://[^/]+").expect("Site root regex pattern is valid")
});

/// Feedly wraps right-to-left titles in `<div>` markup.
static DIV_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?div.*?>").expect("Div tag regex pattern is valid")
});

static SAVED_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)global\.saved$").expect("Saved tag regex pattern is valid")
});

const RTL_MARKER: &str = "direction:rtl";
const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons?domain=";

/// Turns Feedly entries into [`FeedItem`]s.
///
/// Never fails: fields that are missing or malformed come out empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    show_full_content: bool,
}

impl Normalizer {
    pub fn new(show_full_content: bool) -> Self {
        Self { show_full_content }
    }

    pub fn normalize_stream(&self, contents: &StreamContents) -> Vec<FeedItem> {
        contents.items.iter().map(|entry| self.normalize(entry)).collect()
    }

    pub fn normalize(&self, entry: &RawEntry) -> FeedItem {
        let blog_url = entry
            .origin
            .as_ref()
            .and_then(|origin| origin.html_url.as_deref())
            .and_then(|html_url| SITE_ROOT_PATTERN.find(html_url))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "#".to_string());

        let (content, content_direction) = self.pick_content(entry);
        let (title, title_direction) = Self::title(entry.title.as_deref());

        FeedItem {
            id: entry.id.clone(),
            title,
            title_direction,
            content,
            content_direction,
            url: entry
                .alternate
                .first()
                .map(|link| link.href.clone())
                .unwrap_or_default(),
            blog: entry
                .origin
                .as_ref()
                .map(|origin| origin.title.clone())
                .unwrap_or_default(),
            blog_icon: format!("{}{}&alt=feed", FAVICON_SERVICE, blog_url),
            blog_url,
            date: entry.crawled.and_then(DateTime::from_timestamp_millis),
            is_saved: entry
                .tags
                .iter()
                .any(|tag| SAVED_TAG_PATTERN.is_match(&tag.id)),
        }
    }

    /// Full content when enabled and non-empty, otherwise the summary.
    fn pick_content(&self, entry: &RawEntry) -> (String, String) {
        let full = entry
            .content
            .as_ref()
            .filter(|c| self.show_full_content && !c.content.is_empty());

        match full.or(entry.summary.as_ref()) {
            Some(RawContent { content, direction }) => (content.clone(), direction.clone()),
            None => (String::new(), String::new()),
        }
    }

    fn title(raw: Option<&str>) -> (String, String) {
        match raw {
            Some(title) if title.contains(RTL_MARKER) => (
                DIV_TAG_PATTERN.replace_all(title, "").into_owned(),
                "rtl".to_string(),
            ),
            Some(title) => (title.to_string(), String::new()),
            None => (String::new(), String::new()),
        }
    }
}
