// src/services/sharing_service.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::connectors::crm::DocumentFilter;
use crate::connectors::{CrmConnector, IdmConnector, NotifyConnector};
use crate::models::crm::{DocumentHeader, Verification};
use crate::models::scope::{ROLE_USER, ROLE_USER_RETURNS, SCOPE_EXTERNAL};
use crate::models::session::Session;

/// In-flight state of the add-licences flow, parked on the session between
/// pages.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SharingState {
    /// Documents matched from the licence numbers the user entered.
    pub candidates: Vec<Uuid>,
    /// Selected documents still awaiting postal verification.
    pub pending: Vec<Uuid>,
}

impl SharingState {
    pub fn load(session: &Session) -> Self {
        session
            .user_data
            .get("sharing")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Reset the flow once it completes (or is abandoned), so stale
    /// candidates are never re-offered.
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.pending.clear();
    }

    pub fn store(&self, session: &mut Session) {
        if let serde_json::Value::Object(map) = &mut session.user_data {
            map.insert(
                "sharing".to_string(),
                serde_json::to_value(self).unwrap_or_default(),
            );
        } else {
            session.user_data = serde_json::json!({
                "sharing": serde_json::to_value(self).unwrap_or_default()
            });
        }
    }
}

/// Split a free-text field into candidate licence numbers.
pub fn parse_licence_numbers(input: &str) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::new();
    for raw in input.split(|c: char| c == ',' || c.is_whitespace()) {
        let number = raw.trim();
        if !number.is_empty() && !numbers.iter().any(|n| n == number) {
            numbers.push(number.to_string());
        }
    }
    numbers
}

/// Case- and whitespace-insensitive key used for the affinity shortcut.
fn affinity_key(holder_name: &str) -> String {
    holder_name.trim().to_lowercase()
}

// Licence sharing: adding licences to an account (with postal verification
// or the affinity shortcut) and granting colleagues access.
#[derive(Clone)]
pub struct SharingService {
    idm: IdmConnector,
    crm: CrmConnector,
    notify: NotifyConnector,
}

impl SharingService {
    pub fn new(idm: IdmConnector, crm: CrmConnector, notify: NotifyConnector) -> Self {
        Self { idm, crm, notify }
    }

    pub async fn get_document(&self, document_id: Uuid) -> Result<DocumentHeader, AppError> {
        self.crm.get_document_header(document_id).await
    }

    pub async fn documents_for_company(
        &self,
        company_entity_id: Uuid,
    ) -> Result<Vec<DocumentHeader>, AppError> {
        self.crm
            .get_document_headers(&DocumentFilter {
                company_entity_id: Some(company_entity_id),
                ..Default::default()
            })
            .await
    }

    /// Match entered licence numbers against CRM document headers.
    /// Returns the matches plus any numbers nothing matched.
    pub async fn find_candidate_documents(
        &self,
        licence_numbers: &[String],
    ) -> Result<(Vec<DocumentHeader>, Vec<String>), AppError> {
        let found = self
            .crm
            .get_document_headers(&DocumentFilter {
                licence_numbers: Some(licence_numbers.to_vec()),
                ..Default::default()
            })
            .await?;

        let missing: Vec<String> = licence_numbers
            .iter()
            .filter(|number| !found.iter().any(|d| &d.system_external_id == *number))
            .cloned()
            .collect();
        Ok((found, missing))
    }

    /// The affinity shortcut: a candidate whose registered holder matches a
    /// document already verified for this company skips the postal step
    /// entirely. Returns (auto-verified, still-pending).
    pub async fn split_by_affinity(
        &self,
        company_entity_id: Uuid,
        candidates: Vec<DocumentHeader>,
    ) -> Result<(Vec<DocumentHeader>, Vec<DocumentHeader>), AppError> {
        let verified = self
            .crm
            .get_document_headers(&DocumentFilter {
                company_entity_id: Some(company_entity_id),
                verified: Some(true),
                ..Default::default()
            })
            .await?;

        let known: Vec<String> = verified
            .iter()
            .map(|d| affinity_key(&d.metadata.holder_name))
            .collect();

        let (auto, pending): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|doc| known.contains(&affinity_key(&doc.metadata.holder_name)));
        Ok((auto, pending))
    }

    /// Attach auto-verified documents to the company with no postal step.
    pub async fn claim_documents(
        &self,
        company_entity_id: Uuid,
        documents: &[DocumentHeader],
    ) -> Result<(), AppError> {
        if documents.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = documents.iter().map(|d| d.document_id).collect();
        self.crm
            .mark_documents_verified(company_entity_id, &ids)
            .await?;
        tracing::info!(
            "auto-verified {} licence(s) for company {company_entity_id}",
            ids.len()
        );
        Ok(())
    }

    /// Create the verification record, associate the outstanding documents
    /// and post the security code to the chosen address. A notify failure
    /// after the record exists is logged, not fatal: the code can be
    /// re-sent.
    pub async fn start_verification(
        &self,
        session: &Session,
        pending: &[DocumentHeader],
        address_document: &DocumentHeader,
    ) -> Result<Verification, AppError> {
        let company_entity_id = session.company_for_licences();
        let verification = self
            .crm
            .create_verification(session.entity_id, company_entity_id)
            .await?;

        let ids: Vec<Uuid> = pending.iter().map(|d| d.document_id).collect();
        self.crm
            .add_documents_to_verification(verification.verification_id, &ids)
            .await?;

        if let Err(e) = self
            .notify
            .send_security_code_letter(
                &address_document.metadata.address,
                &verification.verification_code,
                ids.len(),
            )
            .await
        {
            tracing::warn!("security code letter dispatch failed: {e}");
        }

        Ok(verification)
    }

    /// Submit the posted security code. A wrong code surfaces as
    /// InvalidSecurityCode and leaves everything pending.
    pub async fn submit_security_code(
        &self,
        session: &Session,
        code: &str,
        pending_document_ids: &[Uuid],
    ) -> Result<Verification, AppError> {
        let company_entity_id = session.company_for_licences();
        let verification = self
            .crm
            .check_verification_code(session.entity_id, company_entity_id, code.trim())
            .await?;

        if !pending_document_ids.is_empty() {
            self.crm
                .mark_documents_verified(company_entity_id, pending_document_ids)
                .await?;
        }
        Ok(verification)
    }

    /// Grant another user access to the inviter's licences. A brand-new
    /// email gets exactly one identity record, one entity and one role.
    pub async fn grant_access(
        &self,
        session: &Session,
        email: &str,
        include_returns: bool,
    ) -> Result<(), AppError> {
        let email = email.trim().to_lowercase();
        let company_entity_id = session.company_for_licences();

        let existing = self.idm.find_user_by_email(&email).await?;
        if existing.is_none() {
            self.idm.create_user(&email, SCOPE_EXTERNAL).await?;
            if let Err(e) = self
                .notify
                .send_new_user_invite(&email, &session.user_name)
                .await
            {
                tracing::warn!("invite email dispatch failed: {e}");
            }
        }

        let entity = self.crm.get_or_create_entity(&email).await?;

        let role = if include_returns {
            ROLE_USER_RETURNS
        } else {
            ROLE_USER
        };
        self.crm
            .add_entity_role(entity.entity_id, company_entity_id, role)
            .await?;

        tracing::info!("granted {role} on company {company_entity_id} to {email}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn licence_numbers_split_on_commas_and_whitespace() {
        let parsed = parse_licence_numbers("AT/CURR/DAILY/01, AT/CURR/WEEKLY/01\nAT/CURR/MONTHLY/01");
        assert_eq!(
            parsed,
            vec!["AT/CURR/DAILY/01", "AT/CURR/WEEKLY/01", "AT/CURR/MONTHLY/01"]
        );
    }

    #[test]
    fn licence_numbers_dedupe_and_drop_empties() {
        let parsed = parse_licence_numbers("  AT/1 ,, AT/1  ,\n");
        assert_eq!(parsed, vec!["AT/1"]);
        assert!(parse_licence_numbers("  , \n").is_empty());
    }

    #[test]
    fn affinity_key_ignores_case_and_padding() {
        assert_eq!(affinity_key(" Big Farm Co  "), affinity_key("big farm co"));
        assert_ne!(affinity_key("Big Farm Co"), affinity_key("Other Farm"));
    }

    #[test]
    fn clearing_the_flow_drops_candidates_and_pending() {
        let mut state = SharingState {
            candidates: vec![Uuid::new_v4(), Uuid::new_v4()],
            pending: vec![Uuid::new_v4()],
        };
        state.clear();
        assert!(state.candidates.is_empty());
        assert!(state.pending.is_empty());
    }

    #[test]
    fn sharing_state_survives_a_session_roundtrip() {
        let mut session = Session {
            session_id: Uuid::new_v4(),
            csrf_token: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: "a@example.com".into(),
            entity_id: Uuid::new_v4(),
            user_data: serde_json::json!({ "existing": true }),
            last_login: None,
            roles: vec![],
            scope: vec![],
            company_entity_id: None,
            created_at: chrono::Utc::now(),
        };

        let state = SharingState {
            candidates: vec![Uuid::new_v4()],
            pending: vec![Uuid::new_v4()],
        };
        state.store(&mut session);

        let loaded = SharingState::load(&session);
        assert_eq!(loaded.candidates, state.candidates);
        assert_eq!(loaded.pending, state.pending);
        // Pre-existing user_data keys are preserved.
        assert_eq!(session.user_data["existing"], serde_json::json!(true));
    }
}
