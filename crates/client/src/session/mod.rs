//! The session service.
//!
//! One [`SessionStore`] owns the signed-in state for the whole process. It
//! is cloned into the API client and every page, persists through a
//! [`SessionStorage`] backend, and broadcasts every change to subscribers.

mod storage;

pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};

use std::sync::{Arc, OnceLock};

use hoarding_core::types::role::deserialize_lenient;
use hoarding_core::{Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Storage key for the access token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key for the JSON user profile.
pub const USER_KEY: &str = "user";
/// Storage key for the device identifier.
pub const DEVICE_ID_KEY: &str = "deviceId";

/// Signed-in user profile as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub role: Option<Role>,
    #[serde(default)]
    pub email: Option<String>,
}

impl SessionUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}

/// Tokens and profile of the signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub user: Option<SessionUser>,
}

impl Session {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: None,
            user: None,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(refresh_token.into()));
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: SessionUser) -> Self {
        self.user = Some(user);
        self
    }
}

/// Shared session service. Clones observe the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Box<dyn SessionStorage>,
    state: watch::Sender<Option<Session>>,
    device_id: OnceLock<String>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Open a store over `storage`, restoring any persisted session.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        let restored = load(&storage);
        if restored.is_some() {
            tracing::debug!("restored persisted session");
        }
        let (state, _) = watch::channel(restored);
        Self {
            inner: Arc::new(SessionStoreInner {
                storage: Box::new(storage),
                state,
                device_id: OnceLock::new(),
            }),
        }
    }

    /// A store that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Current session, if signed in.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.inner.state.borrow().clone()
    }

    /// Replace the session and persist it.
    pub fn set(&self, session: Session) {
        self.persist(TOKEN_KEY, Some(session.access_token.expose_secret()));
        self.persist(
            REFRESH_TOKEN_KEY,
            session.refresh_token.as_ref().map(ExposeSecret::expose_secret),
        );
        let user = session
            .user
            .as_ref()
            .and_then(|user| serde_json::to_string(user).ok());
        self.persist(USER_KEY, user.as_deref());
        self.inner.state.send_replace(Some(session));
    }

    /// Store a refreshed access token, and the rotated refresh token when
    /// the backend issued one.
    ///
    /// Returns `false` without changing anything when no session exists,
    /// so a refresh that finishes after logout cannot sign the user back in.
    pub fn update_access_token(
        &self,
        access_token: SecretString,
        rotated_refresh_token: Option<SecretString>,
    ) -> bool {
        let mut updated = false;
        self.inner.state.send_if_modified(|state| {
            let Some(session) = state.as_mut() else {
                return false;
            };
            session.access_token = access_token.clone();
            if let Some(rotated) = &rotated_refresh_token {
                session.refresh_token = Some(rotated.clone());
            }
            updated = true;
            true
        });
        if updated {
            self.persist(TOKEN_KEY, Some(access_token.expose_secret()));
            if let Some(rotated) = &rotated_refresh_token {
                self.persist(REFRESH_TOKEN_KEY, Some(rotated.expose_secret()));
            }
        }
        updated
    }

    /// Sign out locally: drop tokens and profile. The device id survives.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            self.persist(key, None);
        }
        self.inner.state.send_replace(None);
    }

    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .and_then(|session| session.refresh_token.clone())
    }

    /// Signed-in user. Always `None` without an access token, whatever
    /// profile data may be lying around.
    #[must_use]
    pub fn current_user(&self) -> Option<SessionUser> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .and_then(|session| session.user.clone())
    }

    /// Role of the signed-in user.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .and_then(|session| session.user.as_ref())
            .and_then(|user| user.role)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    /// Stable identifier of this installation, generated on first use.
    pub fn device_id(&self) -> &str {
        self.inner.device_id.get_or_init(|| {
            if let Some(existing) = self.read(DEVICE_ID_KEY) {
                return existing;
            }
            let generated = uuid::Uuid::new_v4().to_string();
            self.persist(DEVICE_ID_KEY, Some(&generated));
            generated
        })
    }

    /// Receiver that observes every set, token update and clear.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.state.subscribe()
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.inner.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(error) => {
                tracing::warn!(key, %error, "failed to read session storage");
                None
            }
        }
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.inner.storage.set(key, value),
            None => self.inner.storage.remove(key),
        };
        if let Err(error) = result {
            tracing::warn!(key, %error, "failed to write session storage");
        }
    }
}

fn load(storage: &dyn SessionStorage) -> Option<Session> {
    let read = |key: &str| match storage.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(error) => {
            tracing::warn!(key, %error, "failed to read session storage");
            None
        }
    };

    let access_token = read(TOKEN_KEY)?;
    let user = read(USER_KEY).and_then(|raw| {
        serde_json::from_str::<SessionUser>(&raw)
            .inspect_err(|error| tracing::warn!(%error, "discarding unreadable stored user"))
            .ok()
    });

    Some(Session {
        access_token: SecretString::from(access_token),
        refresh_token: read(REFRESH_TOKEN_KEY).map(SecretString::from),
        user,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sales_user() -> SessionUser {
        SessionUser {
            id: UserId::new("u1"),
            name: Some("Asha".to_string()),
            role: Some(Role::Sales),
            email: None,
        }
    }

    #[test]
    fn test_set_persists_and_restores() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.set(
            Session::new("a1")
                .with_refresh_token("r1")
                .with_user(sales_user()),
        );

        let restored = SessionStore::new(storage.clone());
        assert_eq!(restored.access_token().unwrap().expose_secret(), "a1");
        assert_eq!(restored.refresh_token().unwrap().expose_secret(), "r1");
        assert_eq!(restored.current_user(), Some(sales_user()));
        assert_eq!(restored.role(), Some(Role::Sales));
    }

    #[test]
    fn test_stale_user_without_token_is_unauthenticated() {
        let storage = MemoryStorage::new();
        storage
            .set(USER_KEY, r#"{"id":"u1","role":"owner"}"#)
            .unwrap();

        let store = SessionStore::new(storage);
        assert!(!store.is_authenticated());
        assert_eq!(store.current_user(), None);
        assert_eq!(store.role(), None);
    }

    #[test]
    fn test_restores_lenient_user() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage
            .set(USER_KEY, r#"{"_id":7,"role":{"name":"Manager"}}"#)
            .unwrap();

        let store = SessionStore::new(storage);
        let user = store.current_user().unwrap();
        assert_eq!(user.id.as_str(), "7");
        assert_eq!(user.role, Some(Role::Manager));
        assert_eq!(user.display_name(), "7");
    }

    #[test]
    fn test_unreadable_user_keeps_token() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage.set(USER_KEY, "{broken").unwrap();

        let store = SessionStore::new(storage);
        assert!(store.is_authenticated());
        assert_eq!(store.current_user(), None);
    }

    #[test]
    fn test_clear_keeps_device_id() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        let device = store.device_id().to_owned();
        store.set(Session::new("a1").with_refresh_token("r1"));
        store.clear();

        assert!(!store.is_authenticated());
        assert_eq!(storage.keys(), vec![DEVICE_ID_KEY.to_string()]);
        assert_eq!(SessionStore::new(storage).device_id(), device);
    }

    #[test]
    fn test_update_access_token() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.set(Session::new("old").with_refresh_token("r1"));

        assert!(store.update_access_token(SecretString::from("new"), None));
        assert_eq!(store.access_token().unwrap().expose_secret(), "new");
        assert_eq!(store.refresh_token().unwrap().expose_secret(), "r1");
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("new"));

        assert!(store.update_access_token(
            SecretString::from("newer"),
            Some(SecretString::from("r2"))
        ));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r2"));
    }

    #[test]
    fn test_update_after_clear_is_ignored() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        assert!(!store.update_access_token(SecretString::from("late"), None));
        assert!(!store.is_authenticated());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = SessionStore::in_memory();
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_none());

        store.set(Session::new("a1").with_user(sales_user()));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        let other = store.clone();
        other.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session = Session::new("super-secret").with_refresh_token("also-secret");
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("also-secret"));
    }
}
