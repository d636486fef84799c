// src/connectors/crm.rs

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::connectors::{build_client, check_status, read_envelope};
use crate::models::crm::{DocumentHeader, Entity, EntityRole, EntityType, Verification};

const SERVICE: &str = "crm";

/// Filter for document-header searches. Serialized as the POST body of
/// the CRM filter endpoint; unset fields are omitted.
#[derive(Debug, Default, Serialize)]
pub struct DocumentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_entity_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licence_numbers: Option<Vec<String>>,
}

// Client for the CRM service: entities, role relationships, document
// headers and postal verifications.
#[derive(Clone)]
pub struct CrmConnector {
    client: Client,
    base_url: String,
    token: String,
}

impl CrmConnector {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: build_client(),
            base_url,
            token,
        }
    }

    pub async fn find_entity_by_name(&self, name: &str) -> Result<Option<Entity>, AppError> {
        let response = self
            .client
            .get(format!("{}/entity", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("entity_nm", name)])
            .send()
            .await?;

        let entities: Vec<Entity> = read_envelope(SERVICE, response).await?;
        Ok(entities.into_iter().next())
    }

    pub async fn create_entity(
        &self,
        name: &str,
        entity_type: EntityType,
    ) -> Result<Entity, AppError> {
        let response = self
            .client
            .post(format!("{}/entity", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({ "entity_nm": name, "entity_type": entity_type }))
            .send()
            .await?;

        read_envelope(SERVICE, response).await
    }

    /// Get-or-create for an individual entity. Check-then-act: two
    /// concurrent first sign-ins for the same new user can race past the
    /// lookup and create two entities. Uniqueness belongs upstream in CRM;
    /// this layer does not serialise first logins.
    pub async fn get_or_create_entity(&self, name: &str) -> Result<Entity, AppError> {
        if let Some(entity) = self.find_entity_by_name(name).await? {
            return Ok(entity);
        }
        tracing::info!("creating CRM entity for {name}");
        self.create_entity(name, EntityType::Individual).await
    }

    pub async fn get_entity_roles(&self, entity_id: Uuid) -> Result<Vec<EntityRole>, AppError> {
        let response = self
            .client
            .get(format!("{}/entity/{}/roles", self.base_url, entity_id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        read_envelope(SERVICE, response).await
    }

    pub async fn add_entity_role(
        &self,
        entity_id: Uuid,
        company_entity_id: Uuid,
        role: &str,
    ) -> Result<EntityRole, AppError> {
        let response = self
            .client
            .post(format!("{}/entity/{}/roles", self.base_url, entity_id))
            .bearer_auth(&self.token)
            .json(&json!({ "company_entity_id": company_entity_id, "role": role }))
            .send()
            .await?;

        read_envelope(SERVICE, response).await
    }

    pub async fn get_document_headers(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<DocumentHeader>, AppError> {
        let response = self
            .client
            .post(format!("{}/documentHeader/filter", self.base_url))
            .bearer_auth(&self.token)
            .json(filter)
            .send()
            .await?;

        read_envelope(SERVICE, response).await
    }

    pub async fn get_document_header(
        &self,
        document_id: Uuid,
    ) -> Result<DocumentHeader, AppError> {
        let response = self
            .client
            .get(format!("{}/documentHeader/{}", self.base_url, document_id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        read_envelope(SERVICE, response).await
    }

    /// "Rename this licence": sets the user-facing alias on the header.
    pub async fn set_document_name(
        &self,
        document_id: Uuid,
        name: &str,
    ) -> Result<DocumentHeader, AppError> {
        let response = self
            .client
            .patch(format!("{}/documentHeader/{}", self.base_url, document_id))
            .bearer_auth(&self.token)
            .json(&json!({ "document_name": name }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        read_envelope(SERVICE, response).await
    }

    /// Create a verification; CRM generates the security code.
    pub async fn create_verification(
        &self,
        entity_id: Uuid,
        company_entity_id: Uuid,
    ) -> Result<Verification, AppError> {
        let response = self
            .client
            .post(format!("{}/verification", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({
                "entity_id": entity_id,
                "company_entity_id": company_entity_id,
                "method": "post",
            }))
            .send()
            .await?;

        read_envelope(SERVICE, response).await
    }

    pub async fn add_documents_to_verification(
        &self,
        verification_id: Uuid,
        document_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let response = self
            .client
            .post(format!(
                "{}/verification/{}/documents",
                self.base_url, verification_id
            ))
            .bearer_auth(&self.token)
            .json(&json!({ "document_ids": document_ids }))
            .send()
            .await?;

        check_status(SERVICE, &response)
    }

    /// Check a submitted security code. A wrong code is a 404 from CRM and
    /// leaves the verification pending.
    pub async fn check_verification_code(
        &self,
        entity_id: Uuid,
        company_entity_id: Uuid,
        verification_code: &str,
    ) -> Result<Verification, AppError> {
        let response = self
            .client
            .post(format!("{}/verification/check", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({
                "entity_id": entity_id,
                "company_entity_id": company_entity_id,
                "verification_code": verification_code,
            }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::InvalidSecurityCode);
        }
        read_envelope(SERVICE, response).await
    }

    pub async fn mark_documents_verified(
        &self,
        company_entity_id: Uuid,
        document_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let response = self
            .client
            .post(format!("{}/documentHeader/verify", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({
                "company_entity_id": company_entity_id,
                "document_ids": document_ids,
            }))
            .send()
            .await?;

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
