// src/services/status_service.rs

use serde::Serialize;
use std::collections::BTreeMap;

use crate::common::error::AppError;
use crate::connectors::{CrmConnector, IdmConnector, PermitConnector, WaterConnector};

type Counts = Option<BTreeMap<String, i64>>;

/// Aggregated KPI counts for the service-status page. A service that
/// failed to answer shows as None (rendered as a dash).
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub idm: Counts,
    pub crm: Counts,
    pub permit: Counts,
    pub water: Counts,
}

#[derive(Clone)]
pub struct StatusService {
    idm: IdmConnector,
    crm: CrmConnector,
    permit: PermitConnector,
    water: WaterConnector,
}

impl StatusService {
    pub fn new(
        idm: IdmConnector,
        crm: CrmConnector,
        permit: PermitConnector,
        water: WaterConnector,
    ) -> Self {
        Self {
            idm,
            crm,
            permit,
            water,
        }
    }

    /// Sequential awaits, one per service. One service being down must not
    /// take the status page down with it.
    pub async fn service_status(&self) -> Result<ServiceStatus, AppError> {
        Ok(ServiceStatus {
            idm: tolerate("idm", self.idm.kpi_counts().await),
            crm: tolerate("crm", self.crm.kpi_counts().await),
            permit: tolerate("permit", self.permit.kpi_counts().await),
            water: tolerate("water", self.water.kpi_counts().await),
        })
    }
}

fn tolerate(service: &str, result: Result<BTreeMap<String, i64>, AppError>) -> Counts {
    match result {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::warn!("{service} status check failed: {e}");
            None
        }
    }
}
