//! Auth gateway: the only component that establishes or replaces sessions.
//!
//! Every operation returns a tagged result; nothing here panics or leaks a
//! transport error type across the boundary.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use donorhub_core::{Address, Credential, Identity, Role};

use crate::http::{Backend, BackendError};
use crate::session::{SessionError, SessionStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Transport failure or timeout; the user may retry.
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid credentials: {}", .0.as_deref().unwrap_or("no details"))]
    InvalidCredentials(Option<String>),

    #[error("registration failed: {}", .0.as_deref().unwrap_or("no details"))]
    RegistrationFailed(Option<String>),

    #[error("profile update failed: {}", .0.as_deref().unwrap_or("no details"))]
    UpdateFailed(Option<String>),

    /// Rejected before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not signed in")]
    Unauthenticated,

    #[error("{0}")]
    Storage(String),
}

impl AuthError {
    /// Text for a transient user notification: the backend's message when it
    /// sent one, a generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(msg) => msg.clone().unwrap_or_else(|| "Login failed".to_string()),
            AuthError::RegistrationFailed(msg) => {
                msg.clone().unwrap_or_else(|| "Registration failed".to_string())
            }
            AuthError::UpdateFailed(msg) => msg.clone().unwrap_or_else(|| "Update failed".to_string()),
            AuthError::Validation(msg) => msg.clone(),
            AuthError::Network(_) => "Could not reach the server. Please try again.".to_string(),
            AuthError::Unauthenticated => "Please sign in to continue.".to_string(),
            AuthError::Storage(_) => "Could not save your session.".to_string(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Network(_))
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotAuthenticated => AuthError::Unauthenticated,
            SessionError::Superseded => {
                AuthError::UpdateFailed(Some("Your session changed while saving".to_string()))
            }
            other => AuthError::Storage(other.to_string()),
        }
    }
}

/// Registration form as the user filled it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub organization: Option<String>,
    pub password: String,
    pub password_confirmation: String,
}

impl RegisterForm {
    /// Client-side checks, run before any network call.
    pub fn validate(&self) -> Result<(), AuthError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Validation(format!("{field} is required")));
            }
        }
        if !self.email.contains('@') {
            return Err(AuthError::Validation("email address is invalid".to_string()));
        }
        if self.password != self.password_confirmation {
            return Err(AuthError::Validation("passwords do not match".to_string()));
        }
        Ok(())
    }
}

/// Partial profile update; absent fields are left to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<&'a str>,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: Option<String>,
    user: Option<Identity>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ProfileResponse {
    user: Identity,
}

#[derive(Debug, Clone)]
pub struct AuthGateway {
    backend: Backend,
}

impl AuthGateway {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.backend.session()
    }

    /// `POST /auth/login`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let request = self
            .backend
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest { email, password });

        let response = self
            .backend
            .execute::<AuthResponse>(request)
            .await
            .map_err(|e| rejected_as(e, AuthError::InvalidCredentials))?;

        let identity = self
            .establish(response, AuthError::InvalidCredentials)
            .await?;
        tracing::info!(user_id = %identity.id, role = %identity.role, "login succeeded");
        Ok(identity)
    }

    /// `POST /auth/register`; the confirmation never leaves the client.
    pub async fn register(&self, form: &RegisterForm) -> Result<Identity, AuthError> {
        form.validate()?;

        let request = self
            .backend
            .request(Method::POST, "/auth/register")
            .json(&RegisterRequest {
                name: form.name.trim(),
                email: form.email.trim(),
                phone: form.phone.trim(),
                role: form.role,
                organization: form
                    .organization
                    .as_deref()
                    .map(str::trim)
                    .filter(|o| !o.is_empty()),
                password: &form.password,
            });

        let response = self
            .backend
            .execute::<AuthResponse>(request)
            .await
            .map_err(|e| rejected_as(e, AuthError::RegistrationFailed))?;

        let identity = self
            .establish(response, AuthError::RegistrationFailed)
            .await?;
        tracing::info!(user_id = %identity.id, role = %identity.role, "registration succeeded");
        Ok(identity)
    }

    /// `PUT /auth/profile`. The returned identity replaces the cached one
    /// wholesale; nothing is merged client-side.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, AuthError> {
        let (request, credential) = self
            .backend
            .authed(Method::PUT, "/auth/profile")
            .map_err(|_| AuthError::Unauthenticated)?;

        let response = self
            .backend
            .execute_authed::<ProfileResponse>(request.json(update), &credential)
            .await
            .map_err(|e| match e {
                BackendError::Unauthenticated => AuthError::Unauthenticated,
                other => rejected_as(other, AuthError::UpdateFailed),
            })?;

        self.session()
            .replace_identity(&credential, response.user.clone())
            .await?;
        tracing::info!(user_id = %response.user.id, "profile updated");
        Ok(response.user)
    }

    /// Always succeeds.
    pub async fn logout(&self) {
        self.session().clear().await;
    }

    async fn establish(
        &self,
        response: AuthResponse,
        rejected: fn(Option<String>) -> AuthError,
    ) -> Result<Identity, AuthError> {
        let (Some(token), Some(identity)) = (response.token, response.user) else {
            return Err(rejected(response.message));
        };
        let credential = Credential::new(token).map_err(|_| rejected(response.message))?;

        self.session().set(identity.clone(), credential).await?;
        Ok(identity)
    }
}

/// Map a transport-level failure: 4xx statuses become the operation's
/// rejection variant; server errors and transport failures are network
/// problems the user may retry.
fn rejected_as(err: BackendError, rejected: fn(Option<String>) -> AuthError) -> AuthError {
    match err {
        BackendError::Status { status, .. } if status >= 500 => {
            AuthError::Network(format!("server error (HTTP {status})"))
        }
        BackendError::Status { message, .. } => rejected(message),
        BackendError::Network(msg) => AuthError::Network(msg),
        BackendError::Decode(msg) => AuthError::Network(format!("unexpected response: {msg}")),
        BackendError::Unauthenticated => AuthError::Unauthenticated,
    }
}
