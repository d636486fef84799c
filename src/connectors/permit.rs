// src/connectors/permit.rs

use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;

use crate::common::error::AppError;
use crate::connectors::{build_client, read_envelope};
use crate::models::crm::PermitLicence;

const SERVICE: &str = "permit";

// Client for the permit repository, which holds the licence documents
// themselves. Licence refs contain slashes, so lookups go via query string.
#[derive(Clone)]
pub struct PermitConnector {
    client: Client,
    base_url: String,
    token: String,
}

impl PermitConnector {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: build_client(),
            base_url,
            token,
        }
    }

    pub async fn get_licence(&self, licence_ref: &str) -> Result<PermitLicence, AppError> {
        let response = self
            .client
            .get(format!("{}/licence", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("licence_ref", licence_ref)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        read_envelope(SERVICE, response).await
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
