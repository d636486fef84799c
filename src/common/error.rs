// src/common/error.rs

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::views;

// The application error taxonomy. Every handler returns Result<_, AppError>
// and this one IntoResponse impl decides what the browser sees:
// not-found -> 404 page, auth failures -> back to /signin, forced reset ->
// change-password with the GUID, anything upstream/unexpected -> 500 page.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("email address already registered")]
    EmailAlreadyExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    // Sign-in intercepted: the account is flagged for a forced password
    // reset. Carries the reset GUID so the redirect can embed it.
    #[error("password reset required")]
    PasswordResetRequired { reset_guid: String },

    #[error("user not found")]
    UserNotFound,

    #[error("not found")]
    NotFound,

    #[error("not authorised")]
    Unauthorized,

    #[error("session cookie invalid or expired")]
    InvalidSessionToken,

    #[error("security code did not match")]
    InvalidSecurityCode,

    // Non-2xx from one of the backend services. No retry: the first
    // upstream failure surfaces to the user (see error handling design).
    #[error("upstream {service} returned status {status}")]
    Upstream { service: &'static str, status: u16 },

    #[error("upstream request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("cookie signing error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("internal server error")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound | AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, Html(views::not_found_page())).into_response()
            }

            // 401/403-class failures all route back to sign-in.
            AppError::Unauthorized
            | AppError::InvalidCredentials
            | AppError::InvalidSessionToken => Redirect::to("/signin").into_response(),

            AppError::PasswordResetRequired { reset_guid } => Redirect::to(&format!(
                "/reset_password_change_password?resetGuid={reset_guid}&forced=1"
            ))
            .into_response(),

            // Forms are normally re-rendered inline by their handlers; this
            // branch only catches payloads that bypassed the form.
            AppError::ValidationError(errors) => {
                let details: Vec<String> = errors
                    .field_errors()
                    .values()
                    .flat_map(|field_errors| field_errors.iter())
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    Html(views::error_page("There is a problem", &details.join("; "))),
                )
                    .into_response()
            }

            AppError::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                Html(views::error_page(
                    "There is a problem",
                    "An account already exists for that email address.",
                )),
            )
                .into_response(),

            AppError::InvalidSecurityCode => (
                StatusCode::BAD_REQUEST,
                Html(views::error_page(
                    "There is a problem",
                    "Check your security code and try again.",
                )),
            )
                .into_response(),

            // Everything else (upstream failures, signing errors, the
            // anyhow catch-all) becomes a logged, generic 500 page.
            ref e => {
                tracing::error!("internal server error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::error_page(
                        "Sorry, there is a problem with the service",
                        "Try again later.",
                    )),
                )
                    .into_response()
            }
        }
    }
}
