//! Data behind the role-conditioned dashboard.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};

use donorhub_auth::DashboardCounts;

use crate::http::{Backend, BackendError};

/// Entries shown under "Recent Activity".
pub const RECENT_ACTIVITY_LIMIT: usize = 5;
const PER_KIND_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Donation,
    Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub title: String,
    pub status: String,
    /// `None` when the backend sent no usable timestamp; such entries sort last.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardData {
    pub counts: DashboardCounts,
    pub recent_activity: Vec<Activity>,
}

const UNTITLED: &str = "Untitled";

/// One donation or request. Every field is optional: a listing is counted
/// even when it is missing data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Listing {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
}

/// Unparseable timestamps are treated as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

#[derive(Deserialize)]
struct DrivesResponse {
    #[serde(default)]
    drives: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct DashboardApi {
    backend: Backend,
}

impl DashboardApi {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Fetch the signed-in user's donations and requests plus all drives,
    /// concurrently.
    pub async fn counts(&self) -> Result<DashboardData, BackendError> {
        let (donations, requests, drives) = tokio::try_join!(
            self.get::<Vec<Listing>>("/donations/user/my-donations"),
            self.get::<Vec<Listing>>("/requests/user/my-requests"),
            self.get::<DrivesResponse>("/drives"),
        )?;

        let counts = DashboardCounts {
            donations: donations.len() as u64,
            requests: requests.len() as u64,
            drives: drives.drives.len() as u64,
        };

        Ok(DashboardData {
            counts,
            recent_activity: recent_activity(donations, requests),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let (request, credential) = self.backend.authed(Method::GET, path)?;
        self.backend.execute_authed(request, &credential).await
    }
}

/// First few of each kind, merged newest first, capped.
fn recent_activity(donations: Vec<Listing>, requests: Vec<Listing>) -> Vec<Activity> {
    let tagged = |kind: ActivityKind| {
        move |l: Listing| Activity {
            kind,
            title: l
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            status: l.status.unwrap_or_default(),
            date: l.created_at,
        }
    };

    let mut activity: Vec<Activity> = donations
        .into_iter()
        .take(PER_KIND_LIMIT)
        .map(tagged(ActivityKind::Donation))
        .chain(
            requests
                .into_iter()
                .take(PER_KIND_LIMIT)
                .map(tagged(ActivityKind::Request)),
        )
        .collect();

    // `None < Some(_)`, so descending order leaves undated entries at the end.
    activity.sort_by(|a, b| b.date.cmp(&a.date));
    activity.truncate(RECENT_ACTIVITY_LIMIT);
    activity
}
