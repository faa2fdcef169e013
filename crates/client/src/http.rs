//! Backend transport shared by every client component.
//!
//! Attaches the bearer credential from the session store, bounds every call
//! by the configured timeout, and tears the session down when the backend
//! rejects the credential.

use std::sync::Arc;

use anyhow::Context;
use reqwest::{IntoUrl, Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use donorhub_core::Credential;

use crate::config::ClientConfig;
use crate::session::SessionStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Transport failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    /// No session, or the backend rejected the credential (session cleared).
    #[error("not authenticated")]
    Unauthenticated,
}

impl BackendError {
    /// Backend-supplied message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            BackendError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct Backend {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl Backend {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// `path` must start with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL for `segments` below the base. Each segment is percent-encoded, so
    /// `/`, `?` and `#` inside an id stay part of that segment.
    pub fn segment_url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BackendError::Network(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Network(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Request without credentials.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Request carrying the current bearer credential, plus that credential so
    /// callers can tell whether the session changed before the reply landed.
    pub(crate) fn authed(
        &self,
        method: Method,
        path: &str,
    ) -> Result<(RequestBuilder, Credential), BackendError> {
        self.authed_url(method, self.url(path))
    }

    /// [`Backend::authed`] for a prebuilt URL (see [`Backend::segment_url`]).
    pub(crate) fn authed_url(
        &self,
        method: Method,
        url: impl IntoUrl,
    ) -> Result<(RequestBuilder, Credential), BackendError> {
        let credential = self
            .session
            .credential()
            .ok_or(BackendError::Unauthenticated)?;
        let request = self
            .client
            .request(method, url)
            .bearer_auth(credential.expose());
        Ok((request, credential))
    }

    /// Send and decode a JSON body.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Send with credentials; a 401 clears the session that issued the call.
    pub(crate) async fn execute_authed<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        credential: &Credential,
    ) -> Result<T, BackendError> {
        let result = self.execute(request).await;
        self.on_authed_result(result, credential).await
    }

    /// Like [`Backend::execute_authed`] for calls whose reply body is irrelevant.
    pub(crate) async fn execute_authed_empty(
        &self,
        request: RequestBuilder,
        credential: &Credential,
    ) -> Result<(), BackendError> {
        let result = self.send(request).await.map(|_| ());
        self.on_authed_result(result, credential).await
    }

    async fn on_authed_result<T>(
        &self,
        result: Result<T, BackendError>,
        credential: &Credential,
    ) -> Result<T, BackendError> {
        match result {
            Err(BackendError::Status { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16() =>
            {
                // A newer session (re-login) must survive a late 401 for the old one.
                if self.session.clear_if_current(credential).await {
                    tracing::warn!("backend rejected credential; session cleared");
                }
                Err(BackendError::Unauthenticated)
            }
            other => other,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, BackendError> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        tracing::debug!(status = status.as_u16(), message = ?message, "backend returned error status");
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

impl core::fmt::Debug for Backend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Backend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn network_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Network(format!("request timed out: {err}"))
    } else {
        BackendError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::storage::MemoryStorage;

    fn backend(base: &str) -> Backend {
        let config = ClientConfig::new(base, PathBuf::from("unused.db"));
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        Backend::new(&config, session).unwrap()
    }

    #[test]
    fn segments_are_escaped() {
        let backend = backend("http://localhost:5001/api/");

        let url = backend.segment_url(&["admin", "users", "x?y=1", "role"]).unwrap();
        assert_eq!(url.path(), "/api/admin/users/x%3Fy=1/role");
        assert_eq!(url.query(), None);

        let url = backend.segment_url(&["admin", "users", "a/b#c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/api/admin/users/a%2Fb%23c");
    }

    #[test]
    fn plain_paths_are_appended_verbatim() {
        let backend = backend("http://localhost:5001/api");
        assert_eq!(backend.url("/auth/login"), "http://localhost:5001/api/auth/login");
    }

    #[test]
    fn authed_requests_need_a_session() {
        let backend = backend("http://localhost:5001/api");
        assert!(matches!(
            backend.authed(Method::GET, "/admin/stats"),
            Err(BackendError::Unauthenticated)
        ));
    }
}
