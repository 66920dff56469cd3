pub mod feedly;
pub mod http_client;
pub mod types;

pub use feedly::{Feedly, StreamQuery};
pub use http_client::HttpApiClient;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::app::Result;

/// A call to one API method.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    pub method: Method,
    /// Query string parameters
    pub params: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Option<Value>) -> Self {
        Self {
            method: Method::POST,
            body,
            ..Self::default()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::PUT,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }
}

/// Result of a request that reached the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    /// The access token is missing, expired or revoked
    AuthRequired,
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::AuthRequired => Outcome::AuthRequired,
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Outcome::AuthRequired)
    }
}

/// Transport to the Feedly API.
///
/// Authorization failures come back as [`Outcome::AuthRequired`]; every
/// other failure is an error.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn request(&self, endpoint: &str, request: ApiRequest) -> Result<Outcome<Value>>;

    /// Apply the session used by subsequent requests.
    fn configure(&self, _access_token: &str, _use_secure_connection: bool) {}
}
