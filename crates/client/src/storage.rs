//! Durable storage for the two session slots.
//!
//! The slots are always written and cleared together; a backend that cannot
//! do that atomically must not implement [`SessionStorage`].

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

/// Slot holding the serialized identity (JSON).
pub const USER_SLOT: &str = "user";
/// Slot holding the raw bearer token.
pub const TOKEN_SLOT: &str = "token";

/// Raw slot contents as found in storage. Either slot may be missing or
/// garbage; interpretation is the session store's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSlots {
    pub user: Option<String>,
    pub token: Option<String>,
}

impl PersistedSlots {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.token.is_none()
    }
}

#[async_trait]
pub trait SessionStorage: Send + Sync + 'static {
    async fn load(&self) -> anyhow::Result<PersistedSlots>;

    /// Write both slots in one atomic step.
    async fn save(&self, user: &str, token: &str) -> anyhow::Result<()>;

    /// Remove both slots in one atomic step. Clearing empty storage succeeds.
    async fn clear(&self) -> anyhow::Result<()>;
}

/// Process-local storage (tests, `--ephemeral` runs).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<PersistedSlots>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from arbitrary slot contents, including inconsistent ones.
    pub fn with_slots(slots: PersistedSlots) -> Self {
        Self {
            slots: Mutex::new(slots),
        }
    }

    pub async fn snapshot(&self) -> PersistedSlots {
        self.slots.lock().await.clone()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self) -> anyhow::Result<PersistedSlots> {
        Ok(self.snapshot().await)
    }

    async fn save(&self, user: &str, token: &str) -> anyhow::Result<()> {
        let mut slots = self.slots.lock().await;
        *slots = PersistedSlots {
            user: Some(user.to_string()),
            token: Some(token.to_string()),
        };
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.slots.lock().await = PersistedSlots::default();
        Ok(())
    }
}

/// SQLite-backed slot storage.
///
/// One row per slot in `session_slots`; writes go through a transaction so
/// both slots change together.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session directory at {:?}", parent))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open session database at {:?}", path))?;

        Self::with_pool(pool).await
    }

    /// A private in-memory database, alive as long as this value.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("invalid in-memory SQLite URL")?;

        // A second connection would see a different (empty) database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("failed to open in-memory session database")?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_slots (
                slot  TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create session_slots table")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStorage for SqliteStorage {
    async fn load(&self) -> anyhow::Result<PersistedSlots> {
        let rows = sqlx::query("SELECT slot, value FROM session_slots")
            .fetch_all(&self.pool)
            .await
            .context("failed to read session slots")?;

        let mut slots = PersistedSlots::default();
        for row in rows {
            let slot: String = row.try_get("slot")?;
            let value: String = row.try_get("value")?;
            match slot.as_str() {
                USER_SLOT => slots.user = Some(value),
                TOKEN_SLOT => slots.token = Some(value),
                other => tracing::debug!(slot = other, "ignoring unknown session slot"),
            }
        }
        Ok(slots)
    }

    async fn save(&self, user: &str, token: &str) -> anyhow::Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin session transaction")?;

        for (slot, value) in [(USER_SLOT, user), (TOKEN_SLOT, token)] {
            sqlx::query(
                r#"
                INSERT INTO session_slots (slot, value)
                VALUES (?1, ?2)
                ON CONFLICT(slot) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(slot)
            .bind(value)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to write session slot '{slot}'"))?;
        }

        tx.commit().await.context("failed to commit session slots")?;
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM session_slots WHERE slot IN (?1, ?2)")
            .bind(USER_SLOT)
            .bind(TOKEN_SLOT)
            .execute(&self.pool)
            .await
            .context("failed to clear session slots")?;
        Ok(())
    }
}
