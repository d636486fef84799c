// src/services/licence_service.rs

use uuid::Uuid;

use crate::common::error::AppError;
use crate::connectors::crm::DocumentFilter;
use crate::connectors::{CrmConnector, PermitConnector};
use crate::models::crm::{DocumentHeader, PermitLicence};
use crate::models::session::Session;

// Licence viewing and renaming for the session's company.
#[derive(Clone)]
pub struct LicenceService {
    crm: CrmConnector,
    permit: PermitConnector,
}

impl LicenceService {
    pub fn new(crm: CrmConnector, permit: PermitConnector) -> Self {
        Self { crm, permit }
    }

    /// All verified document headers for the company the session acts for.
    pub async fn list_licences(&self, session: &Session) -> Result<Vec<DocumentHeader>, AppError> {
        self.crm
            .get_document_headers(&DocumentFilter {
                company_entity_id: Some(session.company_for_licences()),
                verified: Some(true),
                ..Default::default()
            })
            .await
    }

    /// All document headers, no company filter. Internal users only; the
    /// route guard enforces that.
    pub async fn list_all_licences(&self) -> Result<Vec<DocumentHeader>, AppError> {
        self.crm
            .get_document_headers(&DocumentFilter::default())
            .await
    }

    /// A single licence: the CRM header plus the permit repository record.
    /// A document another company owns is a 404, not a 403, so ids cannot
    /// be probed.
    pub async fn get_licence(
        &self,
        session: &Session,
        document_id: Uuid,
    ) -> Result<(DocumentHeader, PermitLicence), AppError> {
        let document = self.owned_document(session, document_id).await?;
        let permit = self.permit.get_licence(&document.system_external_id).await?;
        Ok((document, permit))
    }

    /// Set the user-facing alias; shows up in list and detail views.
    pub async fn rename_licence(
        &self,
        session: &Session,
        document_id: Uuid,
        name: &str,
    ) -> Result<DocumentHeader, AppError> {
        let document = self.owned_document(session, document_id).await?;
        self.crm
            .set_document_name(document.document_id, name.trim())
            .await
    }

    pub async fn get_document(
        &self,
        session: &Session,
        document_id: Uuid,
    ) -> Result<DocumentHeader, AppError> {
        self.owned_document(session, document_id).await
    }

    async fn owned_document(
        &self,
        session: &Session,
        document_id: Uuid,
    ) -> Result<DocumentHeader, AppError> {
        let document = self.crm.get_document_header(document_id).await?;
        if document.company_entity_id != Some(session.company_for_licences()) {
            return Err(AppError::NotFound);
        }
        Ok(document)
    }
}
