//! Session store: the single source of truth for who is signed in.
//!
//! One instance per process, constructed explicitly and shared by `Arc`.
//! Writers are serialized; readers see either the old or the new session,
//! never a mix.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, watch};

use donorhub_core::{Credential, Identity, Session};

use crate::storage::{PersistedSlots, SessionStorage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("failed to persist session: {0}")]
    Storage(String),

    #[error("persisted session is corrupt: {0}")]
    Corrupt(String),

    #[error("no active session")]
    NotAuthenticated,

    #[error("session changed while the request was in flight")]
    Superseded,
}

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<Session>,
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// A store that starts out anonymous. Call [`SessionStore::restore`] to
    /// pick up a persisted session.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (state, _) = watch::channel(Session::Anonymous);
        Self {
            storage,
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// Construct and restore in one step.
    pub async fn open(storage: Arc<dyn SessionStorage>) -> Self {
        let store = Self::new(storage);
        store.restore().await;
        store
    }

    /// Load the persisted session, if any.
    ///
    /// Never fails: missing, partial or malformed state is discarded and the
    /// store falls back to [`Session::Anonymous`].
    pub async fn restore(&self) -> Session {
        let _guard = self.write_lock.lock().await;

        let restored = match self.storage.load().await {
            Ok(slots) => match decode_slots(&slots) {
                Ok(session) => session,
                Err(err) => {
                    tracing::warn!(error = %err, "discarding persisted session");
                    self.discard_persisted().await;
                    Session::Anonymous
                }
            },
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to read persisted session");
                self.discard_persisted().await;
                Session::Anonymous
            }
        };

        if let Some(identity) = restored.identity() {
            tracing::info!(user_id = %identity.id, role = %identity.role, "session restored");
        }

        self.state.send_replace(restored.clone());
        restored
    }

    /// Persist and publish a new session.
    ///
    /// Nothing is published if persisting fails.
    pub async fn set(&self, identity: Identity, credential: Credential) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        self.persist_and_publish(identity, credential).await
    }

    /// Drop the session, persisted and in memory. Idempotent.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        self.discard_persisted().await;

        let previous = self.state.send_replace(Session::Anonymous);
        if let Some(identity) = previous.identity() {
            tracing::info!(user_id = %identity.id, "session cleared");
        }
    }

    /// Clear only if the session still holds `credential`. Returns whether it did.
    pub(crate) async fn clear_if_current(&self, credential: &Credential) -> bool {
        let _guard = self.write_lock.lock().await;
        if self.state.borrow().credential() != Some(credential) {
            return false;
        }
        self.discard_persisted().await;
        self.state.send_replace(Session::Anonymous);
        true
    }

    /// Live snapshot.
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().credential().cloned()
    }

    /// Receiver that observes every mutation as soon as it is published.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Swap in a new identity for the session that issued `issued_with`.
    ///
    /// The credential is kept and both slots are rewritten together. If the
    /// session ended or changed hands meanwhile, the identity is dropped.
    pub(crate) async fn replace_identity(
        &self,
        issued_with: &Credential,
        identity: Identity,
    ) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;

        let credential = match self.current() {
            Session::Anonymous => return Err(SessionError::NotAuthenticated),
            Session::Authenticated { credential, .. } if &credential != issued_with => {
                return Err(SessionError::Superseded);
            }
            Session::Authenticated { credential, .. } => credential,
        };

        self.persist_and_publish(identity, credential).await
    }

    async fn persist_and_publish(
        &self,
        identity: Identity,
        credential: Credential,
    ) -> Result<(), SessionError> {
        let user = serde_json::to_string(&identity)
            .map_err(|e| SessionError::Storage(format!("failed to encode identity: {e}")))?;

        self.storage
            .save(&user, credential.expose())
            .await
            .map_err(|e| SessionError::Storage(format!("{e:#}")))?;

        tracing::info!(user_id = %identity.id, role = %identity.role, "session established");
        self.state
            .send_replace(Session::authenticated(identity, credential));
        Ok(())
    }

    async fn discard_persisted(&self) {
        if let Err(err) = self.storage.clear().await {
            tracing::error!(error = %format!("{err:#}"), "failed to clear persisted session");
        }
    }
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

fn decode_slots(slots: &PersistedSlots) -> Result<Session, SessionError> {
    match (&slots.user, &slots.token) {
        (None, None) => Ok(Session::Anonymous),
        (Some(user), Some(token)) => {
            let identity: Identity = serde_json::from_str(user)
                .map_err(|e| SessionError::Corrupt(format!("identity slot: {e}")))?;
            let credential = Credential::new(token.as_str())
                .map_err(|e| SessionError::Corrupt(format!("token slot: {e}")))?;
            Ok(Session::authenticated(identity, credential))
        }
        (Some(_), None) => Err(SessionError::Corrupt("identity without token".to_string())),
        (None, Some(_)) => Err(SessionError::Corrupt("token without identity".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use donorhub_core::{Role, UserId};
    use proptest::prelude::*;

    fn identity(id: &str, role: Role) -> Identity {
        Identity {
            id: UserId::new(id).unwrap(),
            name: format!("User {id}"),
            email: format!("{id}@example.org"),
            phone: "555-0100".to_string(),
            role,
            address: None,
            organization: None,
        }
    }

    fn store_over(storage: Arc<MemoryStorage>) -> SessionStore {
        SessionStore::new(storage)
    }

    #[tokio::test]
    async fn set_then_current_round_trips() {
        let store = store_over(Arc::new(MemoryStorage::new()));
        let who = identity("u1", Role::Recipient);
        let token = Credential::new("tok-1").unwrap();

        store.set(who.clone(), token.clone()).await.unwrap();

        assert_eq!(store.current(), Session::authenticated(who, token));
    }

    #[tokio::test]
    async fn clear_twice_equals_clear_once() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_over(storage.clone());
        store
            .set(identity("u1", Role::Donor), Credential::new("t").unwrap())
            .await
            .unwrap();

        store.clear().await;
        let once = (store.current(), storage.snapshot().await);
        store.clear().await;
        let twice = (store.current(), storage.snapshot().await);

        assert_eq!(once, twice);
        assert_eq!(twice.0, Session::Anonymous);
        assert!(twice.1.is_empty());
    }

    #[tokio::test]
    async fn restore_picks_up_persisted_session() {
        let storage = Arc::new(MemoryStorage::new());
        let first = store_over(storage.clone());
        first
            .set(identity("u7", Role::Admin), Credential::new("tok-7").unwrap())
            .await
            .unwrap();

        let second = SessionStore::open(storage).await;
        assert_eq!(second.current().role(), Some(Role::Admin));
        assert_eq!(second.credential().unwrap().expose(), "tok-7");
    }

    #[tokio::test]
    async fn restore_discards_malformed_or_partial_state() {
        let cases = [
            PersistedSlots { user: Some("not json".into()), token: Some("tok".into()) },
            PersistedSlots { user: None, token: Some("tok".into()) },
            PersistedSlots {
                user: Some(serde_json::to_string(&identity("u", Role::Donor)).unwrap()),
                token: None,
            },
            PersistedSlots {
                user: Some(r#"{"id":"u","name":"n","email":"e","role":"root"}"#.into()),
                token: Some("tok".into()),
            },
            PersistedSlots {
                user: Some(serde_json::to_string(&identity("u", Role::Donor)).unwrap()),
                token: Some("   ".into()),
            },
        ];

        for slots in cases {
            let storage = Arc::new(MemoryStorage::with_slots(slots.clone()));
            let store = store_over(storage.clone());
            assert_eq!(store.restore().await, Session::Anonymous, "{slots:?}");
            assert!(storage.snapshot().await.is_empty(), "{slots:?} was not discarded");
        }
    }

    #[tokio::test]
    async fn subscribers_see_mutations_immediately() {
        let store = store_over(Arc::new(MemoryStorage::new()));
        let mut rx = store.subscribe();

        store
            .set(identity("u1", Role::Donor), Credential::new("t").unwrap())
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        store.clear().await;
        assert_eq!(*rx.borrow_and_update(), Session::Anonymous);
    }

    #[tokio::test]
    async fn replace_identity_keeps_credential_and_rejects_stale_callers() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_over(storage.clone());
        let token = Credential::new("tok-1").unwrap();
        store.set(identity("u1", Role::Donor), token.clone()).await.unwrap();

        let mut renamed = identity("u1", Role::Donor);
        renamed.name = "Renamed".to_string();
        store.replace_identity(&token, renamed.clone()).await.unwrap();
        assert_eq!(store.current().identity(), Some(&renamed));
        assert_eq!(storage.snapshot().await.token.as_deref(), Some("tok-1"));

        let stale = Credential::new("someone-else").unwrap();
        assert_eq!(
            store.replace_identity(&stale, identity("u1", Role::Admin)).await,
            Err(SessionError::Superseded)
        );

        store.clear().await;
        assert_eq!(
            store.replace_identity(&token, renamed).await,
            Err(SessionError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn clear_if_current_spares_newer_sessions() {
        let store = store_over(Arc::new(MemoryStorage::new()));
        let old = Credential::new("old").unwrap();
        store.set(identity("u1", Role::Donor), old.clone()).await.unwrap();
        store
            .set(identity("u2", Role::Admin), Credential::new("new").unwrap())
            .await
            .unwrap();

        assert!(!store.clear_if_current(&old).await);
        assert_eq!(store.current().role(), Some(Role::Admin));

        let new = store.credential().unwrap();
        assert!(store.clear_if_current(&new).await);
        assert_eq!(store.current(), Session::Anonymous);
    }

    struct BrokenStorage;

    #[async_trait]
    impl SessionStorage for BrokenStorage {
        async fn load(&self) -> anyhow::Result<PersistedSlots> {
            anyhow::bail!("disk on fire")
        }
        async fn save(&self, _user: &str, _token: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
        async fn clear(&self) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    #[tokio::test]
    async fn failed_persist_publishes_nothing() {
        let store = SessionStore::new(Arc::new(BrokenStorage));
        assert_eq!(store.restore().await, Session::Anonymous);

        let result = store
            .set(identity("u1", Role::Donor), Credential::new("t").unwrap())
            .await;
        assert!(matches!(result, Err(SessionError::Storage(_))));
        assert_eq!(store.current(), Session::Anonymous);

        // Clearing still succeeds in memory.
        store.clear().await;
        assert_eq!(store.current(), Session::Anonymous);
    }

    /// Reads and writes work; clearing does not.
    struct StickyStorage(MemoryStorage);

    #[async_trait]
    impl SessionStorage for StickyStorage {
        async fn load(&self) -> anyhow::Result<PersistedSlots> {
            self.0.load().await
        }
        async fn save(&self, user: &str, token: &str) -> anyhow::Result<()> {
            self.0.save(user, token).await
        }
        async fn clear(&self) -> anyhow::Result<()> {
            anyhow::bail!("read-only volume")
        }
    }

    #[tokio::test]
    async fn failed_clear_signs_out_now_but_not_on_disk() {
        let storage = Arc::new(StickyStorage(MemoryStorage::new()));
        let store = SessionStore::new(storage.clone());
        let who = identity("u1", Role::Donor);
        let token = Credential::new("t").unwrap();
        store.set(who.clone(), token.clone()).await.unwrap();

        store.clear().await;
        assert_eq!(store.current(), Session::Anonymous);

        // The slots survived, so the next process start signs back in.
        let next_start = SessionStore::open(storage).await;
        assert_eq!(next_start.current(), Session::authenticated(who, token));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(Role),
        Clear,
        Restore,
        Replace,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            prop::sample::select(Role::ALL.to_vec()).prop_map(Op::Set),
            Just(Op::Clear),
            Just(Op::Restore),
            Just(Op::Replace),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: after every operation, persisted slots are both present
        /// or both absent, and they describe exactly the in-memory session.
        #[test]
        fn identity_and_credential_stay_paired(ops in prop::collection::vec(arb_op(), 1..24)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let storage = Arc::new(MemoryStorage::new());
                let store = store_over(storage.clone());

                for (n, op) in ops.into_iter().enumerate() {
                    match op {
                        Op::Set(role) => {
                            let token = Credential::new(format!("tok-{n}")).unwrap();
                            store.set(identity(&format!("u{n}"), role), token).await.unwrap();
                        }
                        Op::Clear => store.clear().await,
                        Op::Restore => {
                            store.restore().await;
                        }
                        Op::Replace => {
                            if let Some(token) = store.credential() {
                                let who = identity(&format!("r{n}"), Role::Logistics);
                                store.replace_identity(&token, who).await.unwrap();
                            }
                        }
                    }

                    let slots = storage.snapshot().await;
                    match store.current() {
                        Session::Anonymous => {
                            prop_assert!(slots.is_empty());
                        }
                        Session::Authenticated { identity, credential } => {
                            prop_assert_eq!(slots.token.as_deref(), Some(credential.expose()));
                            let persisted: Identity =
                                serde_json::from_str(slots.user.as_deref().unwrap_or_default()).unwrap();
                            prop_assert_eq!(persisted, identity);
                        }
                    }
                }
                Ok(())
            })?;
        }
    }
}
