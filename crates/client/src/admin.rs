//! Admin-only backend endpoints.
//!
//! The client does not check the role here; the backend enforces it on every
//! call and answers 401/403 otherwise.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use donorhub_core::{Role, UserId};

use crate::http::{Backend, BackendError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    #[serde(default)]
    pub users: Option<u64>,
    #[serde(default)]
    pub donations: Option<u64>,
    #[serde(default)]
    pub requests: Option<u64>,
    #[serde(default)]
    pub active_drives: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSummary {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// `GET /admin/stats`. Every figure is optional; views show a dash for gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub totals: Totals,
    #[serde(default)]
    pub pending_requests: Option<u64>,
    #[serde(default)]
    pub available_donations: Option<u64>,
    #[serde(default)]
    pub recent_drives: Vec<DriveSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub page: u32,
    pub per_page: u32,
    pub q: String,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            q: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<ManagedUser>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn headline(&self) -> &str {
        self.title
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("report")
    }

    pub fn body(&self) -> &str {
        self.summary
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ReportsResponse {
    #[serde(default)]
    reports: Vec<Report>,
}

#[derive(Serialize)]
struct RoleChange {
    role: Role,
}

pub const DEFAULT_REPORT_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct AdminApi {
    backend: Backend,
}

impl AdminApi {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub async fn stats(&self) -> Result<AdminStats, BackendError> {
        let (request, credential) = self.backend.authed(Method::GET, "/admin/stats")?;
        self.backend.execute_authed(request, &credential).await
    }

    pub async fn users(&self, query: &UserQuery) -> Result<UserPage, BackendError> {
        let (request, credential) = self.backend.authed(Method::GET, "/admin/users")?;
        let request = request.query(&[
            ("page", query.page.to_string()),
            ("perPage", query.per_page.to_string()),
            ("q", query.q.clone()),
        ]);
        self.backend.execute_authed(request, &credential).await
    }

    pub async fn update_user_role(&self, user_id: &UserId, role: Role) -> Result<(), BackendError> {
        let url = self
            .backend
            .segment_url(&["admin", "users", user_id.as_str(), "role"])?;
        let (request, credential) = self.backend.authed_url(Method::PUT, url)?;
        self.backend
            .execute_authed_empty(request.json(&RoleChange { role }), &credential)
            .await?;
        tracing::info!(user_id = %user_id, role = %role, "user role updated");
        Ok(())
    }

    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), BackendError> {
        let url = self.backend.segment_url(&["admin", "users", user_id.as_str()])?;
        let (request, credential) = self.backend.authed_url(Method::DELETE, url)?;
        self.backend.execute_authed_empty(request, &credential).await?;
        tracing::info!(user_id = %user_id, "user deleted");
        Ok(())
    }

    pub async fn reports(&self, limit: u32) -> Result<Vec<Report>, BackendError> {
        let (request, credential) = self.backend.authed(Method::GET, "/admin/reports")?;
        let request = request.query(&[("limit", limit)]);
        let response: ReportsResponse = self.backend.execute_authed(request, &credential).await?;
        Ok(response.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stats_tolerate_missing_figures() {
        let stats: AdminStats = serde_json::from_value(json!({
            "totals": { "users": 12, "activeDrives": 3 },
            "recentDrives": [{ "_id": "d1", "title": "Winter Clothing Drive" }]
        }))
        .unwrap();
        assert_eq!(stats.totals.users, Some(12));
        assert_eq!(stats.totals.donations, None);
        assert_eq!(stats.totals.active_drives, Some(3));
        assert_eq!(stats.recent_drives[0].id, "d1");
        assert_eq!(stats.pending_requests, None);

        assert_eq!(serde_json::from_value::<AdminStats>(json!({})).unwrap(), AdminStats::default());
    }

    #[test]
    fn report_text_falls_back() {
        let report: Report = serde_json::from_value(json!({
            "_id": "r1",
            "type": "donation_created",
            "message": "A donation was listed",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(report.headline(), "donation_created");
        assert_eq!(report.body(), "A donation was listed");
        assert!(report.created_at.is_some());
    }

    #[test]
    fn user_query_defaults() {
        let q = UserQuery::default();
        assert_eq!((q.page, q.per_page, q.q.as_str()), (1, 20, ""));
    }
}
