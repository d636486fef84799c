// src/routes.rs

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::config::AppState;
use crate::handlers;
use crate::middleware::auth::{holding_page, session_middleware};

/// The complete application router. main.rs serves it; the integration
/// tests drive it directly.
pub fn router(app_state: AppState) -> Router {
    // Public routes: sign-in, registration, password reset, status.
    let public_routes = Router::new()
        .route(
            "/signin",
            get(handlers::auth::get_signin).post(handlers::auth::post_signin),
        )
        .route("/signout", get(handlers::auth::get_signout))
        .route("/signed-out", get(handlers::auth::get_signed_out))
        .route(
            "/register",
            get(handlers::registration::get_register).post(handlers::registration::post_register),
        )
        .route("/success", get(handlers::registration::get_success))
        .route(
            "/send-again",
            get(handlers::registration::get_send_again)
                .post(handlers::registration::post_send_again),
        )
        .route(
            "/reset_password",
            get(handlers::reset_password::get_reset_password)
                .post(handlers::reset_password::post_reset_password),
        )
        .route(
            "/reset_password_check_email",
            get(handlers::reset_password::get_check_email),
        )
        .route(
            "/reset_password_change_password",
            get(handlers::reset_password::get_change_password)
                .post(handlers::reset_password::post_change_password),
        )
        .route("/service-status", get(handlers::status::get_service_status))
        .route("/status", get(handlers::status::get_status));

    // Everything behind a session cookie. The sharing flow additionally
    // carries an external-scope guard in its handlers.
    let licence_routes = Router::new()
        .route("/licences", get(handlers::licences::get_licences))
        .route("/licences/{id}", get(handlers::licences::get_licence))
        .route(
            "/licences/{id}/rename",
            get(handlers::licences::get_rename).post(handlers::licences::post_rename),
        )
        .route(
            "/manage_licences",
            get(handlers::manage_licences::get_manage_licences),
        )
        .route(
            "/manage_licences/access",
            get(handlers::manage_licences::get_access)
                .post(handlers::manage_licences::post_access),
        )
        .route(
            "/add-licences",
            get(handlers::manage_licences::get_add_licences)
                .post(handlers::manage_licences::post_add_licences),
        )
        .route(
            "/select-licences",
            get(handlers::manage_licences::get_select_licences)
                .post(handlers::manage_licences::post_select_licences),
        )
        .route(
            "/select-address",
            get(handlers::manage_licences::get_select_address)
                .post(handlers::manage_licences::post_select_address),
        )
        .route(
            "/security-code",
            get(handlers::manage_licences::get_security_code)
                .post(handlers::manage_licences::post_security_code),
        )
        // Internal-only landing page; the scope guard sits in the handler.
        .route("/admin/licences", get(handlers::licences::get_admin_licences))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(licence_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            holding_page,
        ))
        .with_state(app_state)
}
