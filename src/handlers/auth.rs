// src/handlers/auth.rs

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{error_refs, form_errors},
    models::{auth::SignInForm, scope},
    views,
};

pub(crate) fn auth_cookie(state: &AppState, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.config.cookie_name.clone(), value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.config.secure_cookies);
    cookie
}

fn removal_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.config.cookie_name.clone(), "");
    cookie.set_path("/");
    cookie
}

pub async fn get_signin() -> Html<String> {
    Html(views::signin_page(&[], ""))
}

pub async fn post_signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<SignInForm>,
) -> Result<Response, AppError> {
    // Malformed input re-renders the form; the password is never echoed.
    if let Err(errors) = payload.validate() {
        let pairs = form_errors(&errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::signin_page(&error_refs(&pairs), &payload.email)),
        )
            .into_response());
    }

    match state
        .auth_service
        .verify_credentials(&payload.email, &payload.password)
        .await
    {
        Ok(_) => {}
        Err(AppError::InvalidCredentials) => {
            let errors = [("email", "Check your email address and password")];
            return Ok((
                StatusCode::UNAUTHORIZED,
                Html(views::signin_page(&errors, &payload.email)),
            )
                .into_response());
        }
        // PasswordResetRequired redirects to the forced-change page with
        // the GUID via the error mapping; anything else is a 500.
        Err(e) => return Err(e),
    }

    let presented = jar
        .get(&state.config.cookie_name)
        .map(|c| c.value().to_string());
    let signed = state
        .auth_service
        .sign_in_automatically(&payload.email, presented.as_deref())
        .await?;

    let destination = scope::post_sign_in_path(&signed.session.scope);
    let jar = jar.add(auth_cookie(&state, signed.cookie_value));
    Ok((jar, Redirect::to(destination)).into_response())
}

pub async fn get_signout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(cookie) = jar.get(&state.config.cookie_name) {
        state.auth_service.sign_out(cookie.value()).await?;
    }
    let jar = jar.remove(removal_cookie(&state));
    Ok((jar, Redirect::to("/signed-out")))
}

// Reachable without any authentication.
pub async fn get_signed_out() -> Html<String> {
    Html(views::signed_out_page())
}
