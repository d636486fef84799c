pub mod auth;
pub mod licences;
pub mod manage_licences;
pub mod registration;
pub mod reset_password;
pub mod status;

use uuid::Uuid;
use validator::ValidationErrors;

use crate::common::error::AppError;
use crate::models::session::Session;

/// Flatten validator output into (field, message) pairs for the GOV.UK
/// error summary.
pub(crate) fn form_errors(errors: &ValidationErrors) -> Vec<(String, String)> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().filter_map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| (field.to_string(), m.to_string()))
            })
        })
        .collect()
}

pub(crate) fn error_refs(errors: &[(String, String)]) -> Vec<(&str, &str)> {
    errors
        .iter()
        .map(|(field, message)| (field.as_str(), message.as_str()))
        .collect()
}

/// Every authenticated POST must echo the session's anti-forgery token.
pub(crate) fn check_csrf(session: &Session, token: Uuid) -> Result<(), AppError> {
    if session.csrf_token == token {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}
