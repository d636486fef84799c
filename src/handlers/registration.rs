// src/handlers/registration.rs

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{error_refs, form_errors},
    models::auth::RegisterForm,
    views,
};

pub async fn get_register() -> Html<String> {
    Html(views::register_page(&[], ""))
}

pub async fn post_register(
    State(state): State<AppState>,
    Form(payload): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = payload.validate() {
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::register_page(&error_refs(&pairs), &payload.email)),
        )
            .into_response());
    }

    match state.registration_service.register(&payload.email).await {
        Ok(_) => Ok(Redirect::to("/success").into_response()),
        Err(AppError::EmailAlreadyExists) => {
            let errors = [("email", "An account already exists for this email address")];
            Ok((
                StatusCode::CONFLICT,
                Html(views::register_page(&errors, &payload.email)),
            )
                .into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn get_success() -> Html<String> {
    Html(views::register_success_page())
}

pub async fn get_send_again() -> Html<String> {
    Html(views::send_again_page(&[], ""))
}

pub async fn post_send_again(
    State(state): State<AppState>,
    Form(payload): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = payload.validate() {
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::send_again_page(&error_refs(&pairs), &payload.email)),
        )
            .into_response());
    }

    state.registration_service.send_again(&payload.email).await?;
    Ok(Redirect::to("/success").into_response())
}
