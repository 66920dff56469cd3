use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::api::{ApiClient, ApiRequest, Outcome};
use crate::app::Result;

pub const FEEDLY_API_HOST: &str = "cloud.feedly.com";

#[derive(Debug, Clone, Default)]
struct Session {
    access_token: String,
    use_secure_connection: bool,
}

pub struct HttpApiClient {
    client: Client,
    /// Replaces the Feedly host, e.g. for a local mock server
    base_url: Option<Url>,
    session: RwLock<Session>,
}

impl HttpApiClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: None,
            session: RwLock::new(Session::default()),
        })
    }

    /// Client talking to `base_url` instead of the Feedly API.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut client = Self::new()?;
        client.base_url = Some(base);
        Ok(client)
    }

    fn session(&self) -> Session {
        self.session
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Full URL of an API method.
    pub fn method_url(&self, endpoint: &str, params: &[(String, String)]) -> Result<Url> {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => {
                let scheme = if self.session().use_secure_connection {
                    "https"
                } else {
                    "http"
                };
                Url::parse(&format!("{}://{}/v3/", scheme, FEEDLY_API_HOST))?
            }
        };

        let mut url = base.join(endpoint)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn request(&self, endpoint: &str, request: ApiRequest) -> Result<Outcome<Value>> {
        let url = self.method_url(endpoint, &request.params)?;
        let session = self.session();

        tracing::debug!(method = %request.method, %url, "API request");

        let mut builder = self.client.request(request.method, url);
        if !session.access_token.is_empty() {
            builder = builder.header(AUTHORIZATION, format!("OAuth {}", session.access_token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(endpoint, "API reported missing authorization");
            return Ok(Outcome::AuthRequired);
        }

        response.error_for_status_ref()?;

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(Outcome::Success(Value::Null));
        }

        Ok(Outcome::Success(serde_json::from_slice(&body)?))
    }

    fn configure(&self, access_token: &str, use_secure_connection: bool) {
        let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
        session.access_token = access_token.to_string();
        session.use_secure_connection = use_secure_connection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url_follows_secure_flag() {
        let client = HttpApiClient::new().unwrap();
        let url = client.method_url("markers/counts", &[]).unwrap();
        assert_eq!(url.as_str(), "http://cloud.feedly.com/v3/markers/counts");

        client.configure("token", true);
        let url = client.method_url("markers/counts", &[]).unwrap();
        assert_eq!(url.as_str(), "https://cloud.feedly.com/v3/markers/counts");
    }

    #[test]
    fn test_method_url_keeps_encoded_stream_id() {
        let client = HttpApiClient::with_base_url("http://localhost:1234/v3").unwrap();
        let params = vec![
            ("unreadOnly".to_string(), "true".to_string()),
            ("count".to_string(), "20".to_string()),
        ];
        let url = client
            .method_url("streams/user%2F1%2Fcategory%2Fglobal.all/contents", &params)
            .unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:1234/v3/streams/user%2F1%2Fcategory%2Fglobal.all/contents?unreadOnly=true&count=20"
        );
    }
}
