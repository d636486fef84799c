// src/services/auth.rs

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::connectors::{CrmConnector, IdmConnector};
use crate::models::auth::User;
use crate::models::scope;
use crate::models::session::{Session, SessionClaims};
use crate::services::session_store::SharedSessionStore;

/// A freshly established session plus the signed cookie value carrying its id.
pub struct SignedSession {
    pub session: Session,
    pub cookie_value: String,
}

// Converts an already-authenticated email address into a role-scoped
// session. Credential checking itself is a separate, read-only IDM call.
#[derive(Clone)]
pub struct AuthService {
    idm: IdmConnector,
    crm: CrmConnector,
    sessions: SharedSessionStore,
    cookie_secret: String,
    session_ttl_hours: i64,
}

impl AuthService {
    pub fn new(
        idm: IdmConnector,
        crm: CrmConnector,
        sessions: SharedSessionStore,
        cookie_secret: String,
        session_ttl_hours: i64,
    ) -> Self {
        Self {
            idm,
            crm,
            sessions,
            cookie_secret,
            session_ttl_hours,
        }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Validate raw credentials against IDM. Read-only: no session is
    /// created here. An account flagged for a forced reset is intercepted
    /// before sign-in can complete.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = Self::normalize_email(email);
        let user = self.idm.verify_credentials(&email, password).await?;

        if user.reset_required {
            // Fail closed: a flagged account must never complete sign-in,
            // even when the IDM record is missing its reset GUID.
            return match user.reset_guid.clone() {
                Some(reset_guid) => Err(AppError::PasswordResetRequired { reset_guid }),
                None => Err(anyhow::anyhow!(
                    "reset-required account {email} has no reset guid"
                )
                .into()),
            };
        }
        Ok(user)
    }

    /// Establish a session for an email address that has ALREADY been
    /// authenticated (or proven ownership via a reset GUID).
    pub async fn sign_in_automatically(
        &self,
        email: &str,
        presented_cookie: Option<&str>,
    ) -> Result<SignedSession, AppError> {
        // 1. Normalize.
        let email = Self::normalize_email(email);

        // 2. Identity record lookup.
        let user = self
            .idm
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // 3. Resolve the CRM entity. Get-or-create is not atomic upstream;
        // see the design notes on the first-login race.
        let entity = self.crm.get_or_create_entity(&email).await?;

        // 4. One-time linkage: set the external id only when absent.
        if user.external_id.is_none() {
            self.idm
                .set_external_id(user.user_id, entity.entity_id)
                .await?;
        }

        // 5. Role relationships. Any error aborts the whole sign-in; there
        // is no partial-session fallback.
        let roles = self.crm.get_entity_roles(entity.entity_id).await?;

        // 6. Destroy the session named by any stale cookie before creating
        // the new one.
        if let Some(value) = presented_cookie {
            if let Ok(old_sid) = self.decode_cookie(value) {
                self.sessions.destroy(old_sid).await?;
            }
        }

        // Single-company users get their company selected up front;
        // everyone else carries base scopes until they pick one.
        let mut companies: Vec<Uuid> = roles.iter().map(|r| r.company_entity_id).collect();
        companies.sort();
        companies.dedup();
        let selected_company = match companies.as_slice() {
            [only] => Some(*only),
            _ => None,
        };

        let resolved = scope::resolve_scopes(&user.role.scopes, &roles, selected_company);

        let session = Session {
            session_id: Uuid::new_v4(),
            csrf_token: Uuid::new_v4(),
            user_id: user.user_id,
            user_name: user.user_name.clone(),
            entity_id: entity.entity_id,
            user_data: user.user_data.clone(),
            last_login: Some(Utc::now()),
            roles,
            scope: scope::flatten(&resolved),
            company_entity_id: selected_company,
            created_at: Utc::now(),
        };
        self.sessions.create(session.clone()).await?;

        tracing::info!("signed in {email} with scope {:?}", session.scope);

        // 7. Sign the session id into the cookie value.
        let cookie_value = self.sign_cookie(session.session_id)?;
        Ok(SignedSession {
            session,
            cookie_value,
        })
    }

    /// Resolve a presented cookie to its server-side session.
    pub async fn session_from_cookie(&self, cookie_value: &str) -> Result<Session, AppError> {
        let session_id = self.decode_cookie(cookie_value)?;
        self.sessions
            .get(session_id)
            .await?
            .ok_or(AppError::InvalidSessionToken)
    }

    /// Destroy the session named by the cookie. A cookie that no longer
    /// decodes is simply ignored: signing out twice is not an error.
    pub async fn sign_out(&self, cookie_value: &str) -> Result<(), AppError> {
        if let Ok(session_id) = self.decode_cookie(cookie_value) {
            self.sessions.destroy(session_id).await?;
        }
        Ok(())
    }

    fn sign_cookie(&self, session_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.session_ttl_hours);

        let claims = SessionClaims {
            sid: session_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.cookie_secret.as_ref()),
        )?)
    }

    fn decode_cookie(&self, cookie_value: &str) -> Result<Uuid, AppError> {
        let validation = Validation::default();
        let token_data = decode::<SessionClaims>(
            cookie_value,
            &DecodingKey::from_secret(self.cookie_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidSessionToken)?;

        Ok(token_data.claims.sid)
    }
}
