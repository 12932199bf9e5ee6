//! Shared in-memory stores for the auth-core integration tests
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use openlot_auth_core::{
    ApiClient, AuthConfig, AuthService, Claim, ClientStore, Result, Session, SessionStore,
    UserRecord, UserStore, secret,
};

struct StoredUser {
    record: UserRecord,
    claims: HashSet<Claim>,
}

/// HashMap-backed implementation of all three storage seams.
#[derive(Default)]
pub struct MemoryStore {
    clients: Mutex<Vec<ApiClient>>,
    users: Mutex<Vec<StoredUser>>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&self, client_id: &str, client_secret: &str, name: &str) -> ApiClient {
        let client = ApiClient {
            client_id: client_id.to_string(),
            secret: client_secret.to_string(),
            name: name.to_string(),
        };
        self.clients.lock().unwrap().push(client.clone());
        client
    }

    pub fn add_user(&self, id: i64, username: &str, password: &str, claims: &[Claim]) -> UserRecord {
        let record = UserRecord {
            id,
            username: username.to_string(),
            password_hash: secret::hash_password(password).unwrap(),
        };
        self.users.lock().unwrap().push(StoredUser {
            record: record.clone(),
            claims: claims.iter().copied().collect(),
        });
        record
    }

    /// Insert a session directly, bypassing the service (e.g. already
    /// expired ones).
    pub fn insert_session(&self, session: Session) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.refresh_token.clone(), session);
    }

    pub fn session(&self, refresh_token: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(refresh_token).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ApiClient>> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.record.username == username)
            .map(|u| u.record.clone()))
    }

    async fn claims_of(&self, user_id: i64) -> Result<HashSet<Claim>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.record.id == user_id)
            .map(|u| u.claims.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, session: Session) -> Result<Session> {
        self.insert_session(session.clone());
        Ok(session)
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>> {
        Ok(self.session(refresh_token))
    }

    async fn delete(&self, refresh_token: &str) -> Result<bool> {
        Ok(self.sessions.lock().unwrap().remove(refresh_token).is_some())
    }
}

/// An [`AuthService`] over a fresh [`MemoryStore`], plus the store handle.
pub fn service() -> (AuthService, Arc<MemoryStore>) {
    service_with_config(AuthConfig::default())
}

pub fn service_with_config(config: AuthConfig) -> (AuthService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthService::new(store.clone(), store.clone(), store.clone(), config).unwrap();
    (auth, store)
}
