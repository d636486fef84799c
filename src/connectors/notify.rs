// src/connectors/notify.rs

use reqwest::Client;
use serde_json::json;

use crate::common::error::AppError;
use crate::connectors::{build_client, check_status};

const SERVICE: &str = "notify";

// Client for the notify dispatcher (email and letters). Each message is a
// named template plus a personalisation blob; rendering happens upstream.
#[derive(Clone)]
pub struct NotifyConnector {
    client: Client,
    base_url: String,
    token: String,
}

impl NotifyConnector {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: build_client(),
            base_url,
            token,
        }
    }

    async fn send(
        &self,
        message_ref: &str,
        recipient: &str,
        personalisation: serde_json::Value,
    ) -> Result<(), AppError> {
        let response = self
            .client
            .post(format!("{}/notify/{}", self.base_url, message_ref))
            .bearer_auth(&self.token)
            .json(&json!({
                "recipient": recipient,
                "personalisation": personalisation,
            }))
            .send()
            .await?;

        check_status(SERVICE, &response)
    }

    /// Posts the security code to the registered licence address.
    pub async fn send_security_code_letter(
        &self,
        address: &[String],
        verification_code: &str,
        licence_count: usize,
    ) -> Result<(), AppError> {
        self.send(
            "security_code_letter",
            &address.join(", "),
            json!({
                "verification_code": verification_code,
                "licence_count": licence_count,
            }),
        )
        .await
    }

    pub async fn send_registration_email(&self, email: &str) -> Result<(), AppError> {
        self.send("new_registration_email", email, json!({})).await
    }

    pub async fn send_new_user_invite(&self, email: &str, sender: &str) -> Result<(), AppError> {
        self.send("share_invite_email", email, json!({ "sender": sender }))
            .await
    }
}
