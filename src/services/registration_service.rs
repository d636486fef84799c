// src/services/registration_service.rs

use crate::common::error::AppError;
use crate::connectors::{IdmConnector, NotifyConnector};
use crate::models::auth::User;
use crate::models::scope::SCOPE_EXTERNAL;

// Self-registration and password-reset flows. Both are thin: IDM owns the
// records and the reset GUIDs, notify owns the emails.
#[derive(Clone)]
pub struct RegistrationService {
    idm: IdmConnector,
    notify: NotifyConnector,
}

impl RegistrationService {
    pub fn new(idm: IdmConnector, notify: NotifyConnector) -> Self {
        Self { idm, notify }
    }

    /// Create an external account and send the set-your-password email.
    /// A duplicate email surfaces as EmailAlreadyExists.
    pub async fn register(&self, email: &str) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();
        let user = self.idm.create_user(&email, SCOPE_EXTERNAL).await?;

        if let Err(e) = self.notify.send_registration_email(&email).await {
            tracing::warn!("registration email dispatch failed: {e}");
        }
        Ok(user)
    }

    /// Resend the registration email for an account that never confirmed.
    pub async fn send_again(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim().to_lowercase();
        // Unknown addresses are not reported; the page reads the same
        // either way so accounts cannot be enumerated.
        match self.idm.find_user_by_email(&email).await? {
            Some(_) => self.notify.send_registration_email(&email).await,
            None => Ok(()),
        }
    }

    /// Ask IDM for a reset GUID + email. UserNotFound is swallowed for the
    /// same no-enumeration reason.
    pub async fn start_password_reset(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim().to_lowercase();
        match self.idm.start_password_reset(&email).await {
            Ok(()) | Err(AppError::UserNotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Consume a reset GUID: validate it, set the new password (IDM clears
    /// the GUID) and hand back the account's email so the caller can sign
    /// the user in automatically.
    pub async fn change_password(
        &self,
        reset_guid: &str,
        password: &str,
    ) -> Result<String, AppError> {
        let user = self.idm.find_user_by_reset_guid(reset_guid).await?;
        self.idm
            .update_password_with_guid(reset_guid, password)
            .await?;
        Ok(user.user_name)
    }
}
