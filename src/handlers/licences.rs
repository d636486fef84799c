// src/handlers/licences.rs

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{check_csrf, error_refs, form_errors},
    middleware::auth::{CurrentSession, RequireScope, ScopeInternal},
    views,
};

pub async fn get_licences(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Html<String>, AppError> {
    let documents = state.licence_service.list_licences(&session).await?;
    Ok(Html(views::licences_page(&session, &documents)))
}

pub async fn get_licence(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(document_id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let (document, permit) = state
        .licence_service
        .get_licence(&session, document_id)
        .await?;
    Ok(Html(views::licence_detail_page(&session, &document, &permit)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameForm {
    #[validate(length(min = 1, max = 100, message = "Enter a name for this licence"))]
    pub name: String,
    pub csrf_token: Uuid,
}

pub async fn get_rename(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(document_id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let document = state
        .licence_service
        .get_document(&session, document_id)
        .await?;
    Ok(Html(views::rename_page(&session, &document, &[])))
}

pub async fn post_rename(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(document_id): Path<Uuid>,
    Form(payload): Form<RenameForm>,
) -> Result<Response, AppError> {
    check_csrf(&session, payload.csrf_token)?;

    if let Err(errors) = payload.validate() {
        let document = state
            .licence_service
            .get_document(&session, document_id)
            .await?;
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::rename_page(&session, &document, &error_refs(&pairs))),
        )
            .into_response());
    }

    state
        .licence_service
        .rename_licence(&session, document_id, &payload.name)
        .await?;
    Ok(Redirect::to(&format!("/licences/{document_id}")).into_response())
}

// Internal landing page: every licence in the service, no company filter.
pub async fn get_admin_licences(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeInternal>,
    CurrentSession(session): CurrentSession,
) -> Result<Html<String>, AppError> {
    let documents = state.licence_service.list_all_licences().await?;
    Ok(Html(views::admin_licences_page(&session, &documents)))
}
