// src/connectors/idm.rs

use reqwest::{Client, StatusCode};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::connectors::{build_client, check_status, read_envelope};
use crate::models::auth::User;

const SERVICE: &str = "idm";

// Client for the identity management service: credentials, user records and
// password-reset GUIDs all live there, never in this application.
#[derive(Clone)]
pub struct IdmConnector {
    client: Client,
    base_url: String,
    token: String,
}

impl IdmConnector {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: build_client(),
            base_url,
            token,
        }
    }

    /// Read-only credential check. 401 from IDM means bad credentials;
    /// a reset-required account comes back as a 200 with the flag set and
    /// is mapped by the caller, not here.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AppError> {
        let response = self
            .client
            .post(format!("{}/user/login", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({ "user_name": email, "password": password }))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::InvalidCredentials);
        }
        read_envelope(SERVICE, response).await
    }

    /// Look up by normalized email. Zero results is not an error here.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let response = self
            .client
            .get(format!("{}/user", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("user_name", email)])
            .send()
            .await?;

        let users: Vec<User> = read_envelope(SERVICE, response).await?;
        Ok(users.into_iter().next())
    }

    /// Create an identity record with the given base scope
    /// ("external" for self-registration and invites).
    pub async fn create_user(&self, email: &str, scope: &str) -> Result<User, AppError> {
        let response = self
            .client
            .post(format!("{}/user", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({
                "user_name": email,
                "role": { "scopes": [scope] },
            }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(AppError::EmailAlreadyExists);
        }
        read_envelope(SERVICE, response).await
    }

    /// One-time CRM entity linkage. The caller checks-then-sets; an already
    /// linked user is never patched again.
    pub async fn set_external_id(&self, user_id: Uuid, entity_id: Uuid) -> Result<User, AppError> {
        let response = self
            .client
            .patch(format!("{}/user/{}", self.base_url, user_id))
            .bearer_auth(&self.token)
            .json(&json!({ "external_id": entity_id }))
            .send()
            .await?;

        read_envelope(SERVICE, response).await
    }

    /// Ask IDM to issue a reset GUID and email the holder. 404 means no
    /// such account; callers decide whether that is worth reporting.
    pub async fn start_password_reset(&self, email: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(format!("{}/reset/{}", self.base_url, email))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::UserNotFound);
        }
        check_status(SERVICE, &response)
    }

    pub async fn find_user_by_reset_guid(&self, reset_guid: &str) -> Result<User, AppError> {
        let response = self
            .client
            .get(format!("{}/reset/{}", self.base_url, reset_guid))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        read_envelope(SERVICE, response).await
    }

    /// Set the new password; IDM clears the consumed reset GUID.
    pub async fn update_password_with_guid(
        &self,
        reset_guid: &str,
        password: &str,
    ) -> Result<(), AppError> {
        let response = self
            .client
            .post(format!("{}/reset/{}/password", self.base_url, reset_guid))
            .bearer_auth(&self.token)
            .json(&json!({ "password": password }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        check_status(SERVICE, &response)
    }

    pub async fn kpi_counts(&self) -> Result<BTreeMap<String, i64>, AppError> {
        let response = self
            .client
            .get(format!("{}/kpi", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        read_envelope(SERVICE, response).await
    }
}
