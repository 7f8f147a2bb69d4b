//! HTTP client for the console API.
//!
//! ARCHITECTURE
//! ============
//! Every request goes through [`ApiClient::send`], which plays the role of a
//! request/response interceptor pair:
//! - outbound: attach `Authorization: Bearer <token>` when a session exists;
//! - inbound success: return the JSON body, or the untouched response for
//!   byte-stream downloads;
//! - inbound failure: classify by status, perform the side effect (notice,
//!   or session clear + login redirect for 401), then return the error.
//!
//! ERROR HANDLING
//! ==============
//! The client never recovers. Callers always get `Err` after the side effect
//! so they can react; the navigation guard is where recovery happens.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::notify::{Notice, Notifier};
use crate::router::history::History;
use crate::router::route::{LOGIN_PATH, Location};
use crate::state::auth::AuthState;

pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to access this resource";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource does not exist";
pub const SERVER_ERROR_MESSAGE: &str = "Internal server error";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// No response was received: connect failure, reset, or timeout.
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("request failed with status code {status}")]
    Status { status: u16, message: Option<String> },

    /// The response body was not the JSON the caller expected.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The envelope carried a non-zero application code.
    #[error("{}", .message.as_deref().unwrap_or("request rejected by server"))]
    Application { code: i64, message: Option<String> },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl HttpError {
    /// HTTP status, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The most specific user-facing message: the server's own message when
    /// there is one, `generic` for a bare application failure, otherwise the
    /// error text itself.
    #[must_use]
    pub fn message_or(&self, generic: &str) -> String {
        match self {
            Self::Application { message: Some(m), .. } | Self::Status { message: Some(m), .. } => m.clone(),
            Self::Application { message: None, .. } => generic.to_owned(),
            other => {
                let text = other.to_string();
                if text.is_empty() { generic.to_owned() } else { text }
            }
        }
    }
}

// =============================================================================
// REQUEST OPTIONS
// =============================================================================

/// How the caller wants the successful response handed back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseKind {
    #[default]
    Json,
    /// File downloads: skip decoding and return the whole response.
    Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters; must serialize to a flat JSON object.
    pub query: Option<Value>,
    pub response: ResponseKind,
}

/// A response returned untouched for [`ResponseKind::Bytes`] requests.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Raw(RawResponse),
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<AuthState>,
    history: Arc<History>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`HttpError::ClientBuild`] if the reqwest client cannot be built.
    pub fn new(
        config: &ClientConfig,
        auth: Arc<AuthState>,
        history: Arc<History>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), auth, history, notifier })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request through the interceptor chain.
    ///
    /// # Errors
    ///
    /// Returns the classified [`HttpError`] after its side effect has run.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Payload, HttpError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = self.auth.token() {
            request = request.bearer_auth(token);
        }
        if let Some(query) = &options.query {
            request = request.query(query);
        }
        if let Some(json) = body {
            request = request.json(json);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return Err(self.transport_failure(&method, path, &err)),
        };

        let status = response.status();
        if !status.is_success() {
            let value = response
                .json::<Value>()
                .await
                .unwrap_or_else(|_| Value::Null);
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned);
            return Err(self.status_failure(&method, path, status.as_u16(), message));
        }

        match options.response {
            ResponseKind::Bytes => {
                let headers = response.headers().clone();
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| self.transport_failure(&method, path, &e))?;
                Ok(Payload::Raw(RawResponse { status: status.as_u16(), headers, body: body.to_vec() }))
            }
            ResponseKind::Json => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| self.transport_failure(&method, path, &e))?;
                if bytes.is_empty() {
                    return Ok(Payload::Json(Value::Null));
                }
                let value = serde_json::from_slice(&bytes).map_err(|e| {
                    tracing::warn!(%method, path, error = %e, "response body is not JSON");
                    HttpError::Decode(e.to_string())
                })?;
                Ok(Payload::Json(value))
            }
        }
    }

    /// Send and decode the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the request's [`HttpError`], or [`HttpError::Decode`] if the
    /// body does not fit `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: Option<Value>,
    ) -> Result<T, HttpError> {
        let options = RequestOptions { query, response: ResponseKind::Json };
        match self.send(method, path, body.as_ref(), &options).await? {
            Payload::Json(value) => serde_json::from_value(value).map_err(|e| HttpError::Decode(e.to_string())),
            Payload::Raw(_) => Err(HttpError::Decode("unexpected raw response".to_owned())),
        }
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        self.request(Method::GET, path, None, None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize>(&self, path: &str, query: &Q) -> Result<T, HttpError> {
        let query = to_json(query)?;
        self.request(Method::GET, path, None, Some(query)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, HttpError> {
        self.request(Method::POST, path, Some(to_json(body)?), None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, HttpError> {
        self.request(Method::PUT, path, Some(to_json(body)?), None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, HttpError> {
        self.request(Method::PATCH, path, Some(to_json(body)?), None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        self.request(Method::DELETE, path, None, None).await
    }

    /// Download `path` as raw bytes.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn download(&self, path: &str) -> Result<RawResponse, HttpError> {
        let options = RequestOptions { query: None, response: ResponseKind::Bytes };
        match self.send(Method::GET, path, None, &options).await? {
            Payload::Raw(raw) => Ok(raw),
            Payload::Json(_) => Err(HttpError::Decode("expected raw response".to_owned())),
        }
    }

    // -------------------------------------------------------------------------
    // Failure dispatch
    // -------------------------------------------------------------------------

    fn status_failure(&self, method: &Method, path: &str, status: u16, message: Option<String>) -> HttpError {
        tracing::warn!(%method, path, status, message = message.as_deref().unwrap_or(""), "request failed");
        let error = HttpError::Status { status, message };
        match status {
            401 => self.handle_unauthorized(),
            403 => self.notifier.notify(Notice::error(FORBIDDEN_MESSAGE)),
            404 => self.notifier.notify(Notice::error(NOT_FOUND_MESSAGE)),
            500 => self.notifier.notify(Notice::error(SERVER_ERROR_MESSAGE)),
            _ => self
                .notifier
                .notify(Notice::error(error.message_or(UNKNOWN_ERROR_MESSAGE))),
        }
        error
    }

    fn transport_failure(&self, method: &Method, path: &str, err: &reqwest::Error) -> HttpError {
        tracing::warn!(%method, path, error = %err, timeout = err.is_timeout(), "request did not complete");
        let error = HttpError::Transport(err.to_string());
        self.notifier
            .notify(Notice::error(error.message_or(UNKNOWN_ERROR_MESSAGE)));
        error
    }

    /// Drop the session and send the user to the login page, remembering
    /// where they were. Already on the login page, or a guarded navigation
    /// is running and will redirect on its own: stay put.
    fn handle_unauthorized(&self) {
        self.auth.clear();
        if self.history.is_navigating() {
            tracing::debug!("401 during navigation; leaving the redirect to the router");
            return;
        }
        let current = self.history.current();
        if current.path != LOGIN_PATH {
            self.history
                .push(Location::login_redirect(&current.full_path()));
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, HttpError> {
    serde_json::to_value(value).map_err(|e| HttpError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
