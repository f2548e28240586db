//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::api::UsersApi;
use crate::error::{Error, Result};
use crate::request::{QueryParams, build_url};
use crate::response;
use crate::token::TokenSigner;

/// Default base URL for API requests.
pub const DEFAULT_BASE_URL: &str = "https://chat-us-east-1.stream-io-api.com";

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);

/// Header identifying this SDK to the server.
const CLIENT_HEADER: &str = "x-stream-client";

/// Header naming the scheme of the `Authorization` value.
const AUTH_TYPE_HEADER: &str = "stream-auth-type";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "STREAM_API_KEY";

/// Environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "STREAM_API_SECRET";

/// Environment variable overriding the base URL.
pub const ENV_HOST: &str = "STREAM_HOST";

/// Stream Chat API client.
///
/// Cloning is cheap; clones share configuration and the HTTP connection pool.
///
/// # Example
///
/// ```no_run
/// use stream_chat::StreamClient;
///
/// # async fn example() -> stream_chat::Result<()> {
/// let client = StreamClient::builder("api-key", "api-secret")
///     .timeout(std::time::Duration::from_secs(10))
///     .build()?;
///
/// let token = client.create_token("frodo-baggins", None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StreamClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    /// HTTP client.
    http: reqwest::Client,
    /// Base URL for API requests.
    base_url: String,
    /// API key, sent as a query parameter.
    api_key: String,
    /// Signer keyed by the API secret.
    signer: TokenSigner,
    /// Headers attached to every request, including the server token.
    headers: HeaderMap,
    /// Request timeout.
    timeout: Duration,
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("base_url", &self.inner.base_url)
            .field("api_key", &self.inner.api_key)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

impl StreamClient {
    /// Create a client with default settings.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<Vec<u8>>) -> Result<Self> {
        Self::builder(api_key, api_secret).build()
    }

    /// Create a new client builder.
    pub fn builder(api_key: impl Into<String>, api_secret: impl Into<Vec<u8>>) -> ClientBuilder {
        ClientBuilder::new(api_key, api_secret)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tokens
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a token for `user_id`, expiring at `expires` if given.
    pub fn create_token(&self, user_id: &str, expires: Option<DateTime<Utc>>) -> Result<String> {
        self.create_token_with_claims(user_id, Map::new(), expires)
    }

    /// Create a user token carrying additional claims.
    ///
    /// `user_id` always overrides a `user_id` entry in `claims`.
    pub fn create_token_with_claims(
        &self,
        user_id: &str,
        mut claims: Map<String, Value>,
        expires: Option<DateTime<Utc>>,
    ) -> Result<String> {
        if user_id.is_empty() {
            return Err(Error::precondition("user ID is empty"));
        }

        claims.insert("user_id".to_string(), Value::String(user_id.to_string()));
        self.inner.signer.sign(&claims, expires)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the users API.
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Send an authenticated request and decode the response body into `T`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(method.clone(), path, params, body).await?;
        response::parse_json(&method, response).await
    }

    /// Send an authenticated request, ignoring the response body.
    pub async fn request_empty<B>(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send(method.clone(), path, params, body).await?;
        response::discard(&method, response).await
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: &QueryParams) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, params, None).await
    }

    /// Make a POST request.
    pub async fn post<T, B>(&self, path: &str, params: &QueryParams, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, params, Some(body)).await
    }

    /// Make a PUT request.
    pub async fn put<T, B>(&self, path: &str, params: &QueryParams, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, params, Some(body)).await
    }

    /// Make a PATCH request.
    pub async fn patch<T, B>(&self, path: &str, params: &QueryParams, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, params, Some(body)).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str, params: &QueryParams) -> Result<()> {
        self.request_empty::<()>(Method::DELETE, path, params, None)
            .await
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
        body: Option<&B>,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let inner = &self.inner;
        let url = build_url(&inner.base_url, path, params, &inner.api_key)?;
        let body = body
            .map(|b| serde_json::to_vec(b).map_err(Error::Encode))
            .transpose()?;

        let mut request = inner
            .http
            .request(method.clone(), url)
            .headers(inner.headers.clone())
            .timeout(inner.timeout);
        if let Some(body) = body {
            request = request.body(body);
        }

        tracing::debug!(%method, path, "sending request");
        let response = request.send().await?;
        tracing::trace!(%method, path, status = %response.status(), "received response");
        Ok(response)
    }
}

/// Optional client setting, applied in the order it was given.
#[derive(Debug)]
enum Setting {
    Timeout(Duration),
    BaseUrl(String),
    HttpClient(reqwest::Client),
}

/// Builder for creating a [`StreamClient`].
///
/// Settings are recorded in call order and applied by [`build`](Self::build);
/// when two settings touch the same field, the later one wins.
pub struct ClientBuilder {
    api_key: String,
    api_secret: Vec<u8>,
    settings: Vec<Setting>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api_key", &self.api_key)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            settings: Vec::new(),
        }
    }

    /// Create a builder from `STREAM_API_KEY`, `STREAM_API_SECRET` and the
    /// optional `STREAM_HOST`.
    ///
    /// Missing credentials surface as precondition errors from `build`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let builder = Self::new(
            lookup(ENV_API_KEY).unwrap_or_default(),
            lookup(ENV_API_SECRET).unwrap_or_default(),
        );
        match lookup(ENV_HOST).filter(|host| !host.is_empty()) {
            Some(host) => builder.base_url(host),
            None => builder,
        }
    }

    /// Set the request timeout. Defaults to 6 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.push(Setting::Timeout(timeout));
        self
    }

    /// Set the base URL for the API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.push(Setting::BaseUrl(url.into()));
        self
    }

    /// Use a custom HTTP client, e.g. to route through a proxy.
    ///
    /// The configured timeout is applied per request and overrides any
    /// timeout set on `http`.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.settings.push(Setting::HttpClient(http));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<StreamClient> {
        if self.api_key.is_empty() {
            return Err(Error::precondition("API key is empty"));
        }
        if self.api_secret.is_empty() {
            return Err(Error::precondition("API secret is empty"));
        }

        let signer = TokenSigner::new(&self.api_secret);
        let auth_token = signer.sign(&json!({ "server": true }), None)?;

        let mut timeout = DEFAULT_TIMEOUT;
        let mut base_url = DEFAULT_BASE_URL.to_string();
        let mut http = None;
        for setting in self.settings {
            match setting {
                Setting::Timeout(t) => timeout = t,
                Setting::BaseUrl(url) => base_url = url,
                Setting::HttpClient(client) => http = Some(client),
            }
        }

        url::Url::parse(&base_url)?;

        let http = match http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .build()
                .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(CLIENT_HEADER),
            HeaderValue::from_static(concat!(
                "stream-chat-rust-client-",
                env!("CARGO_PKG_VERSION")
            )),
        );
        let auth_value = HeaderValue::from_str(&auth_token)
            .map_err(|_| Error::Config("Invalid auth token".to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(
            HeaderName::from_static(AUTH_TYPE_HEADER),
            HeaderValue::from_static("jwt"),
        );

        Ok(StreamClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                api_key: self.api_key,
                signer,
                headers,
                timeout,
            }),
        })
    }
}
