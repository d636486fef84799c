// src/handlers/status.rs

use axum::{
    Json,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::{common::error::AppError, config::AppState, views};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub format: Option<String>,
}

/// Aggregated health/KPI counts from the backend services; HTML by
/// default, JSON with ?format=json.
pub async fn get_service_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, AppError> {
    let status = state.status_service.service_status().await?;

    if query.format.as_deref() == Some("json") {
        return Ok(Json(status).into_response());
    }
    Ok(Html(views::service_status_page(&status)).into_response())
}

pub async fn get_status() -> &'static str {
    "OK"
}
