// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// An identity record as IDM returns it. The password itself never reaches
// this application; only the hash's owner (IDM) sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    /// Email address, stored lower-cased and trimmed.
    pub user_name: String,
    /// One-time linkage to the CRM entity. Set on first sign-in, never
    /// overwritten once present.
    pub external_id: Option<Uuid>,
    #[serde(default)]
    pub reset_required: bool,
    pub reset_guid: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub user_data: serde_json::Value,
}

// The IDM role object: a list of base scope strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRole {
    #[serde(default)]
    pub scopes: Vec<String>,
}

// --- Form payloads -------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SignInForm {
    #[validate(email(message = "Enter an email address in the correct format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Enter your password"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email(message = "Enter an email address in the correct format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequestForm {
    #[validate(email(message = "Enter an email address in the correct format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordForm {
    #[validate(length(min = 1, message = "Reset link is missing or has expired"))]
    pub reset_guid: String,
    #[validate(length(min = 8, message = "Enter a password of at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Re-enter the same password"))]
    pub confirm_password: String,
}
