// src/handlers/manage_licences.rs

use axum::{
    Form,
    extract::{RawForm, State},
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
    middleware::auth::{CurrentSession, RequireScope, ScopeExternal},
    models::crm::DocumentHeader,
    services::sharing_service::{SharingState, parse_licence_numbers},
    views,
};

// External users only; internal staff have no licences of their own to manage.
pub async fn get_manage_licences(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(session): CurrentSession,
) -> Result<Html<String>, AppError> {
    let documents = state
        .sharing_service
        .documents_for_company(session.company_for_licences())
        .await?;
    Ok(Html(views::manage_licences_page(&session, &documents)))
}

// --- Add licences --------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct AddLicencesForm {
    #[validate(length(min = 1, message = "Enter at least one licence number"))]
    pub licence_numbers: String,
    pub csrf_token: Uuid,
}

pub async fn get_add_licences(
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(session): CurrentSession,
) -> Result<Html<String>, AppError> {
    Ok(Html(views::add_licences_page(&session, &[], "")))
}

pub async fn post_add_licences(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(mut session): CurrentSession,
    Form(payload): Form<AddLicencesForm>,
) -> Result<Response, AppError> {
    check_csrf(&session, payload.csrf_token)?;

    if let Err(errors) = payload.validate() {
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::add_licences_page(
                &session,
                &error_refs(&pairs),
                &payload.licence_numbers,
            )),
        )
            .into_response());
    }

    let numbers = parse_licence_numbers(&payload.licence_numbers);
    if numbers.is_empty() {
        let errors = [("licence_numbers", "Enter at least one licence number")];
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::add_licences_page(&session, &errors, &payload.licence_numbers)),
        )
            .into_response());
    }

    let (candidates, missing) = state
        .sharing_service
        .find_candidate_documents(&numbers)
        .await?;

    if !missing.is_empty() {
        let message = format!("We could not find: {}", missing.join(", "));
        let errors = [("licence_numbers", message.as_str())];
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::add_licences_page(&session, &errors, &payload.licence_numbers)),
        )
            .into_response());
    }

    let mut flow = SharingState::load(&session);
    flow.candidates = candidates.iter().map(|d| d.document_id).collect();
    flow.pending.clear();
    flow.store(&mut session);
    state.sessions.update(session).await?;

    Ok(Redirect::to("/select-licences").into_response())
}

// --- Select licences -----------------------------------------------------

async fn load_documents(
    state: &AppState,
    ids: &[Uuid],
) -> Result<Vec<DocumentHeader>, AppError> {
    let mut documents = Vec::with_capacity(ids.len());
    for id in ids {
        documents.push(state.sharing_service.get_document(*id).await?);
    }
    Ok(documents)
}

pub async fn get_select_licences(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    let flow = SharingState::load(&session);
    if flow.candidates.is_empty() {
        return Ok(Redirect::to("/add-licences").into_response());
    }
    let candidates = load_documents(&state, &flow.candidates).await?;
    Ok(Html(views::select_licences_page(&session, &candidates, &[])).into_response())
}

/// Checkboxes repeat the `documents` key, so the body is parsed by hand
/// rather than through a derive.
fn parse_selection(body: &str) -> (Vec<Uuid>, Option<Uuid>) {
    let mut documents = Vec::new();
    let mut csrf_token = None;
    for pair in body.split('&') {
        let mut parts = pair.splitn(2, '=');
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        match key {
            "documents" => {
                if let Ok(id) = value.parse() {
                    documents.push(id);
                }
            }
            "csrf_token" => csrf_token = value.parse().ok(),
            _ => {}
        }
    }
    (documents, csrf_token)
}

pub async fn post_select_licences(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(mut session): CurrentSession,
    RawForm(body): RawForm,
) -> Result<Response, AppError> {
    let body = String::from_utf8(body.to_vec()).map_err(|_| AppError::Unauthorized)?;
    let (selected, csrf_token) = parse_selection(&body);
    check_csrf(&session, csrf_token.ok_or(AppError::Unauthorized)?)?;

    let flow = SharingState::load(&session);
    // Only ids offered on the previous page count.
    let selected: Vec<Uuid> = selected
        .into_iter()
        .filter(|id| flow.candidates.contains(id))
        .collect();

    if selected.is_empty() {
        let candidates = load_documents(&state, &flow.candidates).await?;
        let errors = [("documents", "Select at least one licence")];
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::select_licences_page(&session, &candidates, &errors)),
        )
            .into_response());
    }

    let documents = load_documents(&state, &selected).await?;
    let company = session.company_for_licences();
    let (auto, pending) = state
        .sharing_service
        .split_by_affinity(company, documents)
        .await?;

    state.sharing_service.claim_documents(company, &auto).await?;

    let mut flow = flow;
    flow.pending = pending.iter().map(|d| d.document_id).collect();
    if flow.pending.is_empty() {
        // Everything matched the affinity shortcut; no postal step. The
        // flow is over, so the candidates must not be re-offered either.
        flow.clear();
        flow.store(&mut session);
        state.sessions.update(session.clone()).await?;
        return Ok(Html(views::licences_added_page(&session)).into_response());
    }
    flow.store(&mut session);
    state.sessions.update(session.clone()).await?;
    Ok(Redirect::to("/select-address").into_response())
}

// --- Select address ------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SelectAddressForm {
    pub document_id: Uuid,
    pub csrf_token: Uuid,
}

pub async fn get_select_address(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, AppError> {
    let flow = SharingState::load(&session);
    if flow.pending.is_empty() {
        return Ok(Redirect::to("/manage_licences").into_response());
    }
    let pending = load_documents(&state, &flow.pending).await?;
    Ok(Html(views::select_address_page(&session, &pending, &[])).into_response())
}

pub async fn post_select_address(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(session): CurrentSession,
    Form(payload): Form<SelectAddressForm>,
) -> Result<Response, AppError> {
    check_csrf(&session, payload.csrf_token)?;

    let flow = SharingState::load(&session);
    if !flow.pending.contains(&payload.document_id) {
        return Err(AppError::NotFound);
    }

    let pending = load_documents(&state, &flow.pending).await?;
    let address_document = pending
        .iter()
        .find(|d| d.document_id == payload.document_id)
        .ok_or(AppError::NotFound)?;

    state
        .sharing_service
        .start_verification(&session, &pending, address_document)
        .await?;

    Ok(Html(views::verification_sent_page(&session)).into_response())
}

// --- Security code -------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SecurityCodeForm {
    #[validate(length(min = 1, message = "Enter your security code"))]
    pub verification_code: String,
    pub csrf_token: Uuid,
}

pub async fn get_security_code(
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(session): CurrentSession,
) -> Result<Html<String>, AppError> {
    Ok(Html(views::security_code_page(&session, &[])))
}

pub async fn post_security_code(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(mut session): CurrentSession,
    Form(payload): Form<SecurityCodeForm>,
) -> Result<Response, AppError> {
    check_csrf(&session, payload.csrf_token)?;

    if let Err(errors) = payload.validate() {
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::security_code_page(&session, &error_refs(&pairs))),
        )
            .into_response());
    }

    let flow = SharingState::load(&session);
    match state
        .sharing_service
        .submit_security_code(&session, &payload.verification_code, &flow.pending)
        .await
    {
        Ok(_) => {
            let mut flow = flow;
            flow.clear();
            flow.store(&mut session);
            state.sessions.update(session.clone()).await?;
            Ok(Html(views::licences_added_page(&session)).into_response())
        }
        // Wrong code: the verification stays pending and the form
        // re-renders. There is no lockout.
        Err(AppError::InvalidSecurityCode) => {
            let errors = [("verification_code", "Check your security code and try again")];
            Ok((
                StatusCode::BAD_REQUEST,
                Html(views::security_code_page(&session, &errors)),
            )
                .into_response())
        }
        Err(e) => Err(e),
    }
}

// --- Colleague access ----------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct AccessForm {
    #[validate(email(message = "Enter an email address in the correct format"))]
    pub email: String,
    #[serde(default)]
    pub returns: Option<String>,
    pub csrf_token: Uuid,
}

pub async fn get_access(
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(session): CurrentSession,
) -> Result<Html<String>, AppError> {
    Ok(Html(views::access_page(&session, &[], "")))
}

pub async fn post_access(
    State(state): State<AppState>,
    _guard: RequireScope<ScopeExternal>,
    CurrentSession(session): CurrentSession,
    Form(payload): Form<AccessForm>,
) -> Result<Response, AppError> {
    check_csrf(&session, payload.csrf_token)?;

    if let Err(errors) = payload.validate() {
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::access_page(&session, &error_refs(&pairs), &payload.email)),
        )
            .into_response());
    }

    let include_returns = payload.returns.as_deref() == Some("true");
    state
        .sharing_service
        .grant_access(&session, &payload.email, include_returns)
        .await?;

    Ok(Html(views::access_granted_page(&session, &payload.email)).into_response())
}
