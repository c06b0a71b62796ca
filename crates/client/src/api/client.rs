//! HTTP transport with bearer auth and single refresh-and-retry.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::ApiError;
use super::auth::request_token_refresh;
use crate::config::ClientConfig;
use crate::routes::{LoggingNavigator, Navigator, Route};
use crate::session::SessionStore;

/// REST client for the Hoarding Manager backend.
///
/// Cheap to clone; clones share the HTTP connection pool, the session and
/// the in-flight refresh.
///
/// # Authentication
///
/// Every request carries `Authorization: Bearer <token>` when a session
/// exists. The first 401 a request receives triggers one token refresh and
/// one retry; a 401 on the retry is returned as-is. When the refresh itself
/// fails the session is cleared and the navigator is sent to the login page.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    /// Held for the duration of a refresh so concurrent 401s share one.
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`].
#[must_use]
pub struct ApiClientBuilder {
    config: ClientConfig,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    http: Option<reqwest::Client>,
}

impl ApiClientBuilder {
    /// Navigator used for the forced login redirect.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, custom TLS).
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be created.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(concat!("hoarding-client/", env!("CARGO_PKG_VERSION")))
                .build()?,
        };

        Ok(ApiClient {
            inner: Arc::new(ApiClientInner {
                http,
                config: self.config,
                session: self.session,
                navigator: self.navigator,
                refresh_lock: Mutex::new(()),
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig, session: SessionStore) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            session,
            navigator: Arc::new(LoggingNavigator),
            http: None,
        }
    }

    /// Client with the default HTTP settings and a logging navigator.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be created.
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        Self::builder(config, session).build()
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Send the navigator somewhere.
    pub fn navigate(&self, route: Route) {
        self.inner.navigator.navigate(route);
    }

    pub(super) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Send a request and return its JSON body.
    ///
    /// Empty success bodies come back as `Value::Null`, as do success bodies
    /// that are not JSON (with a warning).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` on transport failure, `ApiError::Unauthorized`
    /// for a 401 that a refresh did not resolve, `ApiError::SessionExpired`
    /// when the refresh was rejected, and `ApiError::Status` with the body
    /// attached for any other non-success status.
    #[instrument(skip(self, body, headers))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Value, ApiError> {
        let response = self.send(method, path, body, headers.as_ref()).await?;
        read_json(response).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None, None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, Some(body), None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, Some(body), None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, Some(body), None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None, None).await
    }

    /// Fetch a binary body such as a contract PDF.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    #[instrument(skip(self))]
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.send(Method::GET, path, None, None).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.inner.config.endpoint(path)?;
        let token = self.inner.session.access_token();

        let response = self
            .send_once(&method, &url, body, headers, token.as_ref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        let Some(fresh) = self.refresh_after_unauthorized(token.as_ref()).await? else {
            return Err(unauthorized(response).await);
        };

        tracing::debug!("retrying with refreshed token");
        let retry = self
            .send_once(&method, &url, body, headers, Some(&fresh))
            .await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(unauthorized(retry).await);
        }
        check_status(retry).await
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        headers: Option<&HeaderMap>,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.inner.http.request(method.clone(), url.clone());
        if let Some(headers) = headers {
            request = request.headers(headers.clone());
        }
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    // =========================================================================
    // Token refresh
    // =========================================================================

    /// Obtain a usable access token after `stale` was rejected.
    ///
    /// Returns `Ok(None)` when there is no refresh token, in which case the
    /// 401 is the caller's to report.
    async fn refresh_after_unauthorized(
        &self,
        stale: Option<&SecretString>,
    ) -> Result<Option<SecretString>, ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;
        let session = &self.inner.session;

        match (session.access_token(), stale) {
            (Some(current), Some(stale)) if current.expose_secret() != stale.expose_secret() => {
                tracing::debug!("token already rotated by a concurrent refresh");
                return Ok(Some(current));
            }
            (Some(current), None) => return Ok(Some(current)),
            (None, Some(_)) => return Err(ApiError::SessionExpired),
            _ => {}
        }

        let Some(refresh_token) = session.refresh_token() else {
            return Ok(None);
        };

        let url = self.inner.config.endpoint("/auth/refresh")?;
        match request_token_refresh(&self.inner.http, &url, &refresh_token).await {
            Ok(tokens) => {
                if !session.update_access_token(tokens.access_token.clone(), tokens.refresh_token)
                {
                    return Err(ApiError::SessionExpired);
                }
                tracing::info!("access token refreshed");
                Ok(Some(tokens.access_token))
            }
            Err(error) => {
                tracing::warn!(%error, "token refresh failed, signing out");
                session.clear();
                self.inner.navigator.navigate(Route::Login);
                Err(ApiError::SessionExpired)
            }
        }
    }
}

/// Pass success through; turn anything else into `ApiError::Status`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<Value>().await.ok();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn unauthorized(response: reqwest::Response) -> ApiError {
    ApiError::Unauthorized {
        body: response.json::<Value>().await.ok(),
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, ApiError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes).unwrap_or_else(|error| {
        tracing::warn!(%error, "response body is not JSON");
        Value::Null
    }))
}
