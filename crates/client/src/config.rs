//! Client configuration.
//!
//! The backend base URL is the only externally visible setting; the request
//! timeout and the session database location are local concerns.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const API_URL_ENV: &str = "DONORHUB_API_URL";
pub const TIMEOUT_ENV: &str = "DONORHUB_TIMEOUT_SECS";
pub const SESSION_DB_ENV: &str = "DONORHUB_SESSION_DB";

pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash (e.g. `http://host/api`).
    pub api_base_url: String,
    /// Upper bound on every backend call.
    pub request_timeout: Duration,
    /// SQLite file holding the persisted session slots.
    pub session_db_path: PathBuf,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>, session_db_path: PathBuf) -> Self {
        Self {
            api_base_url: normalize_base_url(&api_base_url.into()),
            request_timeout: DEFAULT_TIMEOUT,
            session_db_path,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build from `DONORHUB_*` environment variables, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"))?;
                if secs == 0 {
                    anyhow::bail!("{TIMEOUT_ENV} must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        let session_db_path = match lookup(SESSION_DB_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_session_db_path()?,
        };

        Ok(Self::new(api_base_url, session_db_path).with_timeout(request_timeout))
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// `{app_data_dir}/donorhub/session.db`.
pub fn default_session_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut path = base;
    path.push("donorhub");
    path.push("session.db");
    Ok(path)
}
