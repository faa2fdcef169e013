//! Application wiring: one session store shared by every service.

use std::sync::Arc;

use anyhow::Context;

use crate::admin::AdminApi;
use crate::config::ClientConfig;
use crate::dashboard::DashboardApi;
use crate::gateway::AuthGateway;
use crate::http::Backend;
use crate::navigator::Navigator;
use crate::session::SessionStore;
use crate::storage::{MemoryStorage, SessionStorage, SqliteStorage};

#[derive(Debug, Clone)]
pub struct AppState {
    pub session: Arc<SessionStore>,
    pub gateway: AuthGateway,
    pub navigator: Navigator,
    pub admin: AdminApi,
    pub dashboard: DashboardApi,
}

impl AppState {
    /// Open the on-disk session database and restore any persisted session.
    pub async fn open(config: &ClientConfig) -> anyhow::Result<Self> {
        let storage = SqliteStorage::open(&config.session_db_path)
            .await
            .with_context(|| {
                format!("failed to open session store at {}", config.session_db_path.display())
            })?;
        Self::with_storage(config, Arc::new(storage)).await
    }

    /// Session lives only as long as the process.
    pub async fn ephemeral(config: &ClientConfig) -> anyhow::Result<Self> {
        Self::with_storage(config, Arc::new(MemoryStorage::new())).await
    }

    pub async fn with_storage(
        config: &ClientConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> anyhow::Result<Self> {
        let session = Arc::new(SessionStore::open(storage).await);
        let backend = Backend::new(config, session.clone())?;

        tracing::debug!(
            api = %config.api_base_url,
            authenticated = session.current().is_authenticated(),
            "client state ready"
        );

        Ok(Self {
            gateway: AuthGateway::new(backend.clone()),
            navigator: Navigator::new(session.clone()),
            admin: AdminApi::new(backend.clone()),
            dashboard: DashboardApi::new(backend),
            session,
        })
    }
}
