// src/services/session_store.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::session::Session;

/// The server-side session store, injected explicitly into the services
/// that need it rather than reached through ambient request state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> Result<(), AppError>;
    async fn get(&self, session_id: Uuid) -> Result<Option<Session>, AppError>;
    async fn update(&self, session: Session) -> Result<(), AppError>;
    async fn destroy(&self, session_id: Uuid) -> Result<(), AppError>;
}

pub type SharedSessionStore = Arc<dyn SessionStore>;

/// In-process store keyed by session id. Expiry is checked on read; an
/// expired entry is dropped and reported as absent.
pub struct InMemorySessionStore {
    ttl: Duration,
    inner: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> Result<(), AppError> {
        self.inner.write().await.insert(session.session_id, session);
        Ok(())
    }

    async fn get(&self, session_id: Uuid) -> Result<Option<Session>, AppError> {
        let expired = {
            let sessions = self.inner.read().await;
            match sessions.get(&session_id) {
                Some(session) if Utc::now() - session.created_at < self.ttl => {
                    return Ok(Some(session.clone()));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.inner.write().await.remove(&session_id);
        }
        Ok(None)
    }

    async fn update(&self, session: Session) -> Result<(), AppError> {
        self.inner.write().await.insert(session.session_id, session);
        Ok(())
    }

    async fn destroy(&self, session_id: Uuid) -> Result<(), AppError> {
        self.inner.write().await.remove(&session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn session(created_at: DateTime<Utc>) -> Session {
        Session {
            session_id: Uuid::new_v4(),
            csrf_token: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: "user@example.com".to_string(),
            entity_id: Uuid::new_v4(),
            user_data: serde_json::json!({}),
            last_login: None,
            roles: vec![],
            scope: vec!["external".to_string()],
            company_entity_id: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn create_get_destroy_roundtrip() {
        let store = InMemorySessionStore::new(Duration::hours(2));
        let s = session(Utc::now());
        let sid = s.session_id;

        store.create(s).await.unwrap();
        assert!(store.get(sid).await.unwrap().is_some());

        store.destroy(sid).await.unwrap();
        assert!(store.get(sid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped_on_read() {
        let store = InMemorySessionStore::new(Duration::hours(2));
        let s = session(Utc::now() - Duration::hours(3));
        let sid = s.session_id;

        store.create(s).await.unwrap();
        assert!(store.get(sid).await.unwrap().is_none());
        // The expired entry is gone, not resurrected.
        assert!(store.get(sid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_the_stored_record() {
        let store = InMemorySessionStore::new(Duration::hours(2));
        let mut s = session(Utc::now());
        let sid = s.session_id;
        store.create(s.clone()).await.unwrap();

        s.company_entity_id = Some(Uuid::new_v4());
        store.update(s.clone()).await.unwrap();

        let loaded = store.get(sid).await.unwrap().unwrap();
        assert_eq!(loaded.company_entity_id, s.company_entity_id);
    }
}
