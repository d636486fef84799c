// src/connectors/water.rs

use reqwest::Client;
use std::collections::BTreeMap;

use crate::common::error::AppError;
use crate::connectors::{build_client, read_envelope};

const SERVICE: &str = "water";

// Client for the water service, which owns returns and bill runs. Only its
// KPI counts are read here; all billing computation stays upstream.
#[derive(Clone)]
pub struct WaterConnector {
    client: Client,
    base_url: String,
    token: String,
}

impl WaterConnector {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: build_client(),
            base_url,
            token,
        }
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
