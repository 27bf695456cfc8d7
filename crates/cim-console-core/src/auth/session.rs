use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::storage::{Storage, TOKEN_KEY, USER_KEY};

/// The signed-in user as persisted under the `user` key.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        [&self.name, &self.email, &self.id]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or("unknown")
    }
}

/// Token and identity always travel together; there is no half-signed-in state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated { user: Identity, token: String },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

pub struct SessionStore {
    storage: Arc<dyn Storage>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);
        Self { storage, state_tx }
    }

    /// Adopt the persisted session if one is present and well-formed.
    /// Returns whether the store ended up authenticated.
    pub fn initialize(&mut self) -> bool {
        let state = match self.read_persisted() {
            Ok(Some((user, token))) => {
                debug!(user = %user.display_name(), "Persisted session restored");
                SessionState::Authenticated { user, token }
            }
            Ok(None) => {
                debug!("No persisted session found");
                SessionState::Unauthenticated
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable persisted session");
                SessionState::Unauthenticated
            }
        };
        let authenticated = state.is_authenticated();
        self.state_tx.send_replace(state);
        authenticated
    }

    fn read_persisted(&self) -> Result<Option<(Identity, String)>> {
        let token = self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let user = self.storage.get(USER_KEY)?;
        match (token, user) {
            (Some(token), Some(user)) => {
                let identity: Identity = serde_json::from_str(&user)
                    .context("Persisted user record is not a JSON object")?;
                Ok(Some((identity, token)))
            }
            _ => Ok(None),
        }
    }

    /// Exchange credentials for a token and persist the new session.
    ///
    /// On failure the store stays unauthenticated and the error is returned
    /// as-is (an `ApiError` can be recovered with `downcast_ref`).
    pub async fn login(&mut self, api: &ApiClient, username: &str, password: &str) -> Result<Identity> {
        if username.is_empty() || password.is_empty() {
            return Err(anyhow::anyhow!("Username and password required"));
        }

        let grant = api.request_token(username, password).await?;
        let user = grant.user.unwrap_or_else(|| Identity::named(username));

        self.persist(&user, &grant.access_token)?;
        self.state_tx.send_replace(SessionState::Authenticated {
            user: user.clone(),
            token: grant.access_token,
        });
        info!(user = %user.display_name(), "Login successful");
        Ok(user)
    }

    fn persist(&self, user: &Identity, token: &str) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage
            .set(TOKEN_KEY, token)
            .context("Failed to persist token")?;
        if let Err(e) = self.storage.set(USER_KEY, &user_json) {
            // Never leave a token without its identity behind
            if let Err(rollback) = self.storage.remove(TOKEN_KEY) {
                warn!(error = %rollback, "Failed to roll back persisted token");
            }
            return Err(e.context("Failed to persist user"));
        }
        Ok(())
    }

    /// Clear the session. Safe to call when already logged out.
    pub fn logout(&mut self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to clear persisted session key");
            }
        }
        if self.state_tx.borrow().is_authenticated() {
            info!("Logged out");
        }
        self.state_tx.send_replace(SessionState::Unauthenticated);
    }

    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state_tx.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<Identity> {
        match &*self.state_tx.borrow() {
            SessionState::Authenticated { user, .. } => Some(user.clone()),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn token(&self) -> Option<String> {
        match &*self.state_tx.borrow() {
            SessionState::Authenticated { token, .. } => Some(token.clone()),
            SessionState::Unauthenticated => None,
        }
    }

    /// Observe session transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::storage::{FaultyStorage, FileStorage, MemoryStorage};
    use mockito::Server;

    fn store_with(storage: Arc<dyn Storage>) -> SessionStore {
        SessionStore::new(storage)
    }

    #[test]
    fn test_initialize_without_persisted_session() {
        let mut store = store_with(Arc::new(MemoryStorage::new()));
        assert!(!store.initialize());
        assert_eq!(store.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_initialize_restores_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc123").unwrap();
        storage.set(USER_KEY, r#"{"name":"Alice","email":"alice@example.com"}"#).unwrap();

        let mut store = store_with(storage);
        assert!(store.initialize());
        assert_eq!(store.token().as_deref(), Some("abc123"));
        assert_eq!(store.user().unwrap().display_name(), "Alice");
    }

    #[test]
    fn test_initialize_rejects_half_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc123").unwrap();
        let mut store = store_with(storage.clone());
        assert!(!store.initialize());

        storage.remove(TOKEN_KEY).unwrap();
        storage.set(USER_KEY, r#"{"name":"Alice"}"#).unwrap();
        assert!(!store.initialize());
    }

    #[test]
    fn test_initialize_rejects_malformed_user() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc123").unwrap();
        storage.set(USER_KEY, "[1, 2, 3]").unwrap();
        let mut store = store_with(storage);
        assert!(!store.initialize());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_logout_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc123").unwrap();
        storage.set(USER_KEY, r#"{"name":"Alice"}"#).unwrap();
        let mut store = store_with(storage.clone());
        store.initialize();

        store.logout();
        let once = (store.state(), storage.get(TOKEN_KEY).unwrap(), storage.get(USER_KEY).unwrap());
        store.logout();
        let twice = (store.state(), storage.get(TOKEN_KEY).unwrap(), storage.get(USER_KEY).unwrap());

        assert_eq!(once, (SessionState::Unauthenticated, None, None));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_logout_clears_state_when_storage_refuses() {
        let mut storage = FaultyStorage::signed_in();
        storage.fail_remove = true;
        let storage = Arc::new(storage);
        let mut store = store_with(storage.clone());
        assert!(store.initialize());

        store.logout();

        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(store.token().is_none());
        // Keys are still on disk; only the in-memory session is gone
        assert!(storage.get(TOKEN_KEY).unwrap().is_some());
    }

    #[test]
    fn test_initialize_with_unreadable_storage_is_signed_out() {
        let mut storage = FaultyStorage::signed_in();
        storage.fail_get = true;
        let mut store = store_with(Arc::new(storage));
        assert!(!store.initialize());
        assert_eq!(store.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc123").unwrap();
        storage.set(USER_KEY, r#"{"name":"Alice"}"#).unwrap();
        let mut store = store_with(storage);
        let rx = store.subscribe();

        store.initialize();
        assert!(rx.borrow().is_authenticated());
        store.logout();
        assert!(!rx.borrow().is_authenticated());
    }

    #[test]
    fn test_identity_display_name_fallbacks() {
        assert_eq!(Identity::named("Alice").display_name(), "Alice");
        let by_email = Identity {
            email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(by_email.display_name(), "a@example.com");
        assert_eq!(Identity::default().display_name(), "unknown");
    }

    #[tokio::test]
    async fn test_login_persists_token_and_identity() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"abc123","token_type":"Bearer","user":{"name":"Alice"}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path()));
        let api = ApiClient::new(&server.url(), storage.clone()).unwrap();
        let mut store = store_with(storage.clone());

        let user = store.login(&api, "alice", "secret").await.unwrap();

        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));
        let persisted: Identity =
            serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, Identity::named("Alice"));

        // A fresh store over the same directory sees the session
        let mut restored = store_with(Arc::new(FileStorage::new(dir.path())));
        assert!(restored.initialize());
    }

    #[tokio::test]
    async fn test_login_without_embedded_identity_uses_username() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"abc123","token_type":"Bearer"}"#)
            .create_async()
            .await;

        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let api = ApiClient::new(&server.url(), storage.clone()).unwrap();
        let mut store = store_with(storage);

        let user = store.login(&api, "bob", "pw").await.unwrap();
        assert_eq!(user.display_name(), "bob");
    }

    #[tokio::test]
    async fn test_failed_login_stays_unauthenticated() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(401)
            .create_async()
            .await;

        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let api = ApiClient::new(&server.url(), storage.clone()).unwrap();
        let mut store = store_with(storage.clone());

        let err = store.login(&api, "alice", "wrong").await.unwrap_err();

        assert!(err.downcast_ref::<ApiError>().map(ApiError::is_unauthorized).unwrap_or(false));
        assert!(!store.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let api = ApiClient::new("http://127.0.0.1:9", storage.clone()).unwrap();
        let mut store = store_with(storage);
        assert!(store.login(&api, "", "secret").await.is_err());
        assert!(store.login(&api, "alice", "").await.is_err());
    }
}
