// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// A CRM entity: one per distinct person, or one per company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: Uuid,
    pub entity_nm: String,
    pub entity_type: EntityType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Individual,
    Company,
}

// Association between an entity, a company entity and a role name.
// An entity can hold several roles against the same company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRole {
    pub entity_role_id: Uuid,
    pub entity_id: Uuid,
    pub company_entity_id: Uuid,
    pub role: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// CRM's view of a licence: the document header that links a permit-side
/// licence number to a company, a verified flag and an optional alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub document_id: Uuid,
    /// The licence number, e.g. "AT/CURR/DAILY/01".
    pub system_external_id: String,
    /// User-supplied alias ("Rename this licence").
    pub document_name: Option<String>,
    pub company_entity_id: Option<Uuid>,
    pub verified: bool,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Registered licence holder name, as printed on the licence.
    #[serde(default)]
    pub holder_name: String,
    /// Postal address lines of the registered holder.
    #[serde(default)]
    pub address: Vec<String>,
}

impl DocumentHeader {
    /// Display name: the alias when set, the licence number otherwise.
    pub fn display_name(&self) -> &str {
        self.document_name
            .as_deref()
            .unwrap_or(&self.system_external_id)
    }
}

// A pending postal verification: a code was (or is about to be) posted to
// the registered address; the documents stay unverified until it comes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub verification_id: Uuid,
    pub entity_id: Uuid,
    pub company_entity_id: Uuid,
    pub verification_code: String,
    pub date_created: DateTime<Utc>,
    pub date_verified: Option<DateTime<Utc>>,
}

// The permit repository's licence record. The data blob is rendered as-is
// on the licence detail page; its shape belongs to the permit service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitLicence {
    pub licence_ref: String,
    #[serde(default)]
    pub licence_data: serde_json::Value,
}
