// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::marker::PhantomData;

use crate::{common::error::AppError, config::AppState, models::session::Session};

/// Reads the auth cookie, resolves it to a server-side session and parks
/// the session in the request extensions. No cookie means straight back to
/// /signin via the error mapping.
pub async fn session_middleware(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cookie = jar
        .get(&app_state.config.cookie_name)
        .ok_or(AppError::Unauthorized)?;

    let session = app_state
        .auth_service
        .session_from_cookie(cookie.value())
        .await?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// When the holding page is on, everything except the status endpoints is
/// bounced to the configured URL.
pub async fn holding_page(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if app_state.config.holding_page_enabled {
        let path = request.uri().path();
        if path != "/status" && path != "/service-status" {
            return Redirect::to(&app_state.config.holding_page_redirect).into_response();
        }
    }
    next.run(request).await
}

// Extractor for the authenticated session placed by session_middleware.
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(AppError::Unauthorized)
    }
}

/// A scope a route can demand.
pub trait ScopeDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Guard extractor: the session must carry the scope or the request is
/// rejected (and redirected to sign-in by the error mapping).
pub struct RequireScope<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireScope<T>
where
    T: ScopeDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AppError::Unauthorized)?;

        if !session.scope.iter().any(|s| s == T::slug()) {
            return Err(AppError::Unauthorized);
        }
        Ok(RequireScope(PhantomData))
    }
}

// ---
// SCOPE DEFINITIONS
// ---

pub struct ScopeInternal;
impl ScopeDef for ScopeInternal {
    fn slug() -> &'static str {
        crate::models::scope::SCOPE_INTERNAL
    }
}

pub struct ScopeExternal;
impl ScopeDef for ScopeExternal {
    fn slug() -> &'static str {
        crate::models::scope::SCOPE_EXTERNAL
    }
}
