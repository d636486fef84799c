// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::crm::EntityRole;
use crate::models::scope::SCOPE_INTERNAL;

// The server-side session record, created on sign-in and destroyed on
// sign-out. The browser only ever holds the signed session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    /// Anti-forgery token, echoed back by every authenticated form.
    pub csrf_token: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub entity_id: Uuid,
    /// Free-form blob carried over from the identity record, plus any
    /// in-flight multi-page form state (e.g. the licence-sharing flow).
    pub user_data: serde_json::Value,
    pub last_login: Option<DateTime<Utc>>,
    /// All EntityRole rows for this entity, as fetched at sign-in.
    pub roles: Vec<EntityRole>,
    /// Flattened capability list; see models::scope.
    pub scope: Vec<String>,
    /// The company the user is currently acting for, when one is selected.
    pub company_entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_internal(&self) -> bool {
        self.scope.iter().any(|s| s == SCOPE_INTERNAL)
    }

    /// The company context licences are read against. External users with
    /// no company role act as their own (individual) entity.
    pub fn company_for_licences(&self) -> Uuid {
        self.company_entity_id.unwrap_or(self.entity_id)
    }
}

// Claims signed into the auth cookie. Only the session id travels to the
// browser; everything else stays in the server-side store.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session id.
    pub sid: Uuid,
    /// Expiration time (unix timestamp).
    pub exp: usize,
    /// Issued at (unix timestamp).
    pub iat: usize,
}
