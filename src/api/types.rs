//! Payloads returned by the Feedly API.
//!
//! Entry fields are decoded leniently: a field with an unexpected shape
//! falls back to its default instead of failing the whole stream.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<RawEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<Value> = lenient(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match RawEntry::deserialize(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping entry that is not an object");
                None
            }
        })
        .collect())
}

/// `GET streams/:streamId/contents`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamContents {
    #[serde(deserialize_with = "lenient")]
    pub id: String,
    #[serde(deserialize_with = "lenient_entries")]
    pub items: Vec<RawEntry>,
    #[serde(deserialize_with = "lenient")]
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEntry {
    #[serde(deserialize_with = "lenient")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub content: Option<RawContent>,
    #[serde(deserialize_with = "lenient")]
    pub summary: Option<RawContent>,
    #[serde(deserialize_with = "lenient")]
    pub alternate: Vec<RawLink>,
    #[serde(deserialize_with = "lenient")]
    pub origin: Option<RawOrigin>,
    /// Milliseconds since the epoch
    #[serde(deserialize_with = "lenient")]
    pub crawled: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub tags: Vec<RawTag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContent {
    pub content: String,
    pub direction: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLink {
    pub href: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOrigin {
    pub title: String,
    #[serde(rename = "htmlUrl")]
    pub html_url: Option<String>,
    #[serde(rename = "streamId")]
    pub stream_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTag {
    pub id: String,
    pub label: Option<String>,
}

/// `GET markers/counts`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnreadCounts {
    pub unreadcounts: Vec<UnreadCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UnreadCount {
    pub id: String,
    pub count: i64,
}

/// Element of `GET subscriptions`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Subscription {
    pub id: String,
    pub title: Option<String>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: String,
    pub label: Option<String>,
}

/// `POST auth/token`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id: Option<String>,
    pub plan: Option<String>,
}
