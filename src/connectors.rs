// src/connectors.rs
//
// Thin HTTP clients for the backend services this application fronts.
// Every connector speaks JSON with a static bearer token, applies a default
// request timeout and performs no retries: the first failure surfaces.

pub mod crm;
pub mod idm;
pub mod notify;
pub mod permit;
pub mod water;

pub use crm::CrmConnector;
pub use idm::IdmConnector;
pub use notify::NotifyConnector;
pub use permit::PermitConnector;
pub use water::WaterConnector;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::common::error::AppError;

/// The `{error, data}` envelope the backend services wrap responses in.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub error: Option<String>,
    pub data: Option<T>,
}

pub(crate) fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Check the status, then unwrap the `{error, data}` envelope.
pub(crate) async fn read_envelope<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream {
            service,
            status: status.as_u16(),
        });
    }

    let envelope: ApiEnvelope<T> = response.json().await?;
    if let Some(message) = envelope.error {
        tracing::error!("{service} returned an error payload: {message}");
        return Err(anyhow::anyhow!("{service} error: {message}").into());
    }
    envelope
        .data
        .ok_or_else(|| anyhow::anyhow!("{service} response had neither data nor error").into())
}

/// For endpoints whose success response carries no body worth reading.
pub(crate) fn check_status(
    service: &'static str,
    response: &reqwest::Response,
) -> Result<(), AppError> {
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream {
            service,
            status: status.as_u16(),
        });
    }
    Ok(())
}
