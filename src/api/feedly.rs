use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::types::{StreamContents, Subscription, TokenResponse, UnreadCount, UnreadCounts};
use crate::api::{ApiClient, ApiRequest, Outcome};
use crate::app::Result;

/// Parameters of a stream contents request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamQuery {
    pub unread_only: bool,
    pub count: Option<usize>,
}

impl StreamQuery {
    pub fn unread(count: usize) -> Self {
        Self {
            unread_only: true,
            count: Some(count),
        }
    }
}

/// Typed Feedly v3 methods on top of an [`ApiClient`].
#[derive(Clone)]
pub struct Feedly {
    client: Arc<dyn ApiClient>,
}

impl Feedly {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }

    pub fn configure(&self, access_token: &str, use_secure_connection: bool) {
        self.client.configure(access_token, use_secure_connection);
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: ApiRequest,
    ) -> Result<Outcome<T>> {
        match self.client.request(endpoint, request).await? {
            Outcome::Success(value) => Ok(Outcome::Success(serde_json::from_value(value)?)),
            Outcome::AuthRequired => Ok(Outcome::AuthRequired),
        }
    }

    async fn call_unit(&self, endpoint: &str, request: ApiRequest) -> Result<Outcome<()>> {
        let outcome = self.client.request(endpoint, request).await?;
        Ok(outcome.map(|_| ()))
    }

    pub async fn stream_contents(
        &self,
        stream_id: &str,
        query: StreamQuery,
    ) -> Result<Outcome<StreamContents>> {
        let endpoint = format!("streams/{}/contents", urlencoding::encode(stream_id));
        let mut request = ApiRequest::get();
        if query.unread_only {
            request = request.param("unreadOnly", true);
        }
        if let Some(count) = query.count {
            request = request.param("count", count);
        }
        self.call(&endpoint, request).await
    }

    pub async fn unread_counts(&self) -> Result<Outcome<Vec<UnreadCount>>> {
        let outcome: Outcome<UnreadCounts> = self.call("markers/counts", ApiRequest::get()).await?;
        Ok(outcome.map(|counts| counts.unreadcounts))
    }

    pub async fn subscriptions(&self) -> Result<Outcome<Vec<Subscription>>> {
        self.call("subscriptions", ApiRequest::get()).await
    }

    pub async fn mark_as_read(&self, entry_ids: &[String]) -> Result<Outcome<()>> {
        let body = json!({
            "action": "markAsRead",
            "type": "entries",
            "entryIds": entry_ids,
        });
        self.call_unit("markers", ApiRequest::post(Some(body))).await
    }

    pub async fn tag_entry(&self, tag_id: &str, entry_id: &str) -> Result<Outcome<()>> {
        let endpoint = format!("tags/{}", urlencoding::encode(tag_id));
        let body = json!({ "entryId": entry_id });
        self.call_unit(&endpoint, ApiRequest::put(body)).await
    }

    pub async fn untag_entry(&self, tag_id: &str, entry_id: &str) -> Result<Outcome<()>> {
        let endpoint = format!(
            "tags/{}/{}",
            urlencoding::encode(tag_id),
            urlencoding::encode(entry_id)
        );
        self.call_unit(&endpoint, ApiRequest::delete()).await
    }

    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Outcome<TokenResponse>> {
        let request = ApiRequest::post(None)
            .param("refresh_token", refresh_token)
            .param("client_id", client_id)
            .param("client_secret", client_secret)
            .param("grant_type", "refresh_token");
        self.call("auth/token", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<(String, ApiRequest)>>,
        response: Value,
    }

    #[async_trait]
    impl ApiClient for RecordingClient {
        async fn request(&self, endpoint: &str, request: ApiRequest) -> Result<Outcome<Value>> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), request));
            Ok(Outcome::Success(self.response.clone()))
        }
    }

    #[tokio::test]
    async fn test_stream_contents_encodes_stream_id() {
        let client = Arc::new(RecordingClient {
            response: json!({"items": []}),
            ..Default::default()
        });
        let feedly = Feedly::new(client.clone());

        feedly
            .stream_contents("user/1/category/global.all", StreamQuery::unread(20))
            .await
            .unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[0].0, "streams/user%2F1%2Fcategory%2Fglobal.all/contents");
        assert_eq!(
            calls[0].1.params,
            vec![
                ("unreadOnly".to_string(), "true".to_string()),
                ("count".to_string(), "20".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_mark_as_read_body() {
        let client = Arc::new(RecordingClient::default());
        let feedly = Feedly::new(client.clone());

        feedly.mark_as_read(&["a".into(), "b".into()]).await.unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[0].0, "markers");
        assert_eq!(calls[0].1.method, reqwest::Method::POST);
        assert_eq!(
            calls[0].1.body,
            Some(json!({"action": "markAsRead", "type": "entries", "entryIds": ["a", "b"]}))
        );
    }

    #[tokio::test]
    async fn test_untag_entry_path() {
        let client = Arc::new(RecordingClient::default());
        let feedly = Feedly::new(client.clone());

        feedly
            .untag_entry("user/1/tag/global.saved", "feed/x_1")
            .await
            .unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[0].0, "tags/user%2F1%2Ftag%2Fglobal.saved/feed%2Fx_1");
        assert_eq!(calls[0].1.method, reqwest::Method::DELETE);
    }
}
