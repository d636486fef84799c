// src/handlers/reset_password.rs

use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{auth::auth_cookie, error_refs, form_errors},
    models::auth::{ChangePasswordForm, ResetRequestForm},
    models::scope,
    views,
};

pub async fn get_reset_password() -> Html<String> {
    Html(views::reset_request_page(&[], ""))
}

pub async fn post_reset_password(
    State(state): State<AppState>,
    Form(payload): Form<ResetRequestForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = payload.validate() {
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::reset_request_page(&error_refs(&pairs), &payload.email)),
        )
            .into_response());
    }

    // Always the same response whether or not the account exists.
    state
        .registration_service
        .start_password_reset(&payload.email)
        .await?;
    Ok(Redirect::to("/reset_password_check_email").into_response())
}

pub async fn get_check_email() -> Html<String> {
    Html(views::reset_check_email_page())
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordQuery {
    #[serde(rename = "resetGuid")]
    pub reset_guid: Option<String>,
    pub forced: Option<String>,
}

pub async fn get_change_password(
    Query(query): Query<ChangePasswordQuery>,
) -> Result<Response, AppError> {
    let Some(reset_guid) = query.reset_guid else {
        // No GUID: start the flow over.
        return Ok(Redirect::to("/reset_password").into_response());
    };
    let forced = query.forced.is_some();
    Ok(Html(views::change_password_page(&reset_guid, &[], forced)).into_response())
}

pub async fn post_change_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<ChangePasswordForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = payload.validate() {
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::change_password_page(
                &payload.reset_guid,
                &error_refs(&pairs),
                false,
            )),
        )
            .into_response());
    }

    // An unknown or already-consumed GUID renders the generic problem
    // page, not a 404; expiry is IDM's concern, not checked here.
    let email = match state
        .registration_service
        .change_password(&payload.reset_guid, &payload.password)
        .await
    {
        Ok(email) => email,
        Err(AppError::NotFound) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Html(views::error_page(
                    "There is a problem",
                    "This password reset link is not valid. Ask for a new one.",
                )),
            )
                .into_response());
        }
        Err(e) => return Err(e),
    };

    // Proof of mailbox ownership doubles as authentication.
    let presented = jar
        .get(&state.config.cookie_name)
        .map(|c| c.value().to_string());
    let signed = state
        .auth_service
        .sign_in_automatically(&email, presented.as_deref())
        .await?;

    let destination = scope::post_sign_in_path(&signed.session.scope);
    let jar = jar.add(auth_cookie(&state, signed.cookie_value));
    Ok((jar, Redirect::to(destination)).into_response())
}
