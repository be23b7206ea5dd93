//! Authenticated HTTP access to the analytics API
//!
//! [`AuthenticatedClient`] sends every request with the session cookie
//! jar attached. When the API answers 401 it refreshes the session once
//! (shared by all requests failing in the same window) and replays the
//! request a single time.

mod error;
mod refresh;

pub use error::{FetchError, RefreshError};
pub use refresh::REFRESH_PATH;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::security::redact_url;
use refresh::RefreshCoordinator;

/// Replays allowed after a successful refresh
const MAX_AUTH_RETRIES: u8 = 1;

/// A request that can be sent more than once
///
/// `reqwest::RequestBuilder` is consumed on send, so requests are kept in
/// this owned form and rebuilt for the replay after a refresh.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl FetchRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a query parameter
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends a query parameter when `value` is set
    pub fn query_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Serializes `body` as JSON and sets the content type
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }
}

/// HTTP client that recovers from expired sessions
///
/// Share one instance (behind an `Arc`) across everything that talks to
/// the API; the refresh single-flight only covers requests sent through
/// the same instance.
pub struct AuthenticatedClient {
    http: Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    refresh_state: RefreshCoordinator,
}

impl AuthenticatedClient {
    /// Builds a client with a cookie jar, request timeout and user agent
    /// taken from `config`
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone());

        if config.request_timeout_secs > 0 {
            builder = builder.timeout(config.request_timeout());
        }

        Ok(Self {
            http: builder.build()?,
            config,
            store,
            refresh_state: RefreshCoordinator::default(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Absolute URL for an API path such as `/api/profile`
    pub fn endpoint(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// True while a session refresh is in flight
    pub fn is_refreshing(&self) -> bool {
        self.refresh_state.is_refreshing()
    }

    /// Sends a request, refreshing the session once on 401
    ///
    /// Non-401 responses are returned as-is, whatever their status. A 401
    /// triggers (or joins) the session refresh and the request is replayed
    /// once; a 401 on the replay is reported as [`FetchError::Unauthorized`].
    pub async fn request(&self, request: FetchRequest) -> Result<Response, FetchError> {
        let mut retries_left = MAX_AUTH_RETRIES;

        loop {
            let response = self.request_once(&request).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if retries_left == 0 {
                tracing::warn!(
                    "{} {} still unauthorized after refresh",
                    request.method,
                    redact_url(&request.url)
                );
                return Err(FetchError::Unauthorized);
            }
            retries_left -= 1;

            tracing::debug!(
                "{} {} returned 401, recovering session",
                request.method,
                redact_url(&request.url)
            );
            self.recover_session().await?;
        }
    }

    /// Sends a request once, with cookies but without session recovery
    ///
    /// For endpoints where a 401 means bad input rather than an expired
    /// session, such as login.
    pub async fn request_once(&self, request: &FetchRequest) -> Result<Response, FetchError> {
        tracing::debug!("{} {}", request.method, redact_url(&request.url));

        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        Ok(builder.send().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, MockTokenStore, TokenStoreError};

    #[test]
    fn test_fetch_request_builder() {
        let request = FetchRequest::get("http://localhost/api/creative/filter")
            .query("limit", 20)
            .query_opt("category_id", Some(3))
            .query_opt::<u32>("brand_id", None);

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.url(), "http://localhost/api/creative/filter");
        assert_eq!(
            request.query_pairs(),
            &[
                ("limit".to_string(), "20".to_string()),
                ("category_id".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_fetch_request_json_sets_content_type() {
        let request = FetchRequest::post("http://localhost/api/login")
            .json(&serde_json::json!({ "email": "a@b.co" }))
            .unwrap();

        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(request.body.as_deref(), Some(&br#"{"email":"a@b.co"}"#[..]));
    }

    #[test]
    fn test_client_endpoint() {
        let client = AuthenticatedClient::new(
            ClientConfig::with_api_url("http://localhost:8000/"),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap();

        assert_eq!(client.endpoint("/api/profile"), "http://localhost:8000/api/profile");
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_refresh_without_token_fails_fast() {
        // Unroutable origin: any network call would surface as Network, not NoCredential
        let client = AuthenticatedClient::new(
            ClientConfig::with_api_url("http://127.0.0.1:9"),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap();

        let err = client.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::NoCredential));
    }

    #[tokio::test]
    async fn test_refresh_storage_failure_keeps_token() {
        let mut store = MockTokenStore::new();
        store.expect_get().times(1).returning(|| {
            Err(TokenStoreError::Keyring(keyring::Error::PlatformFailure(
                "locked".into(),
            )))
        });
        store.expect_clear().never();

        let client = AuthenticatedClient::new(
            ClientConfig::with_api_url("http://127.0.0.1:9"),
            Arc::new(store),
        )
        .unwrap();

        let err = client.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::Storage(_)));
    }
}
