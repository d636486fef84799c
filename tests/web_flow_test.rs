//! Router-level tests: requests driven through the full middleware stack
//! with a real session cookie.

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{envelope, external_session, internal_session, setup, store_session};
use water_abstraction_ui::routes::router;
use water_abstraction_ui::services::sharing_service::SharingState;

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn an_invalid_reset_link_renders_the_problem_page_not_a_404() {
    let backends = setup().await;

    Mock::given(method("GET"))
        .and(path("/reset/does-not-exist"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&backends.idm)
        .await;

    let app = router(backends.state.clone());
    let form = "reset_guid=does-not-exist\
                &password=correct-horse-battery&confirm_password=correct-horse-battery";
    let response = app
        .oneshot(
            Request::post("/reset_password_change_password")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_text(response).await;
    assert!(html.contains("This password reset link is not valid"));
    assert!(!html.contains("Page not found"));
}

#[tokio::test]
async fn internal_users_are_kept_out_of_the_sharing_flow() {
    let backends = setup().await;
    let session = internal_session();
    let cookie = store_session(&backends.state, &session).await;
    let app = router(backends.state.clone());

    for route in [
        "/manage_licences",
        "/manage_licences/access",
        "/add-licences",
        "/select-licences",
        "/select-address",
        "/security-code",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::get(route)
                    .header(header::COOKIE, format!("session={cookie}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "route {route}");
        assert_eq!(response.headers()[header::LOCATION], "/signin");
    }
}

#[tokio::test]
async fn a_fully_auto_verified_selection_ends_the_flow() {
    let backends = setup().await;
    let company_id = Uuid::new_v4();
    let mut session = external_session(Uuid::new_v4(), company_id);
    let document_id = Uuid::new_v4();

    // The add-licences step already matched one candidate.
    SharingState {
        candidates: vec![document_id],
        pending: vec![],
    }
    .store(&mut session);
    let cookie = store_session(&backends.state, &session).await;

    Mock::given(method("GET"))
        .and(path(format!("/documentHeader/{document_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "document_id": document_id,
            "system_external_id": "AT/CURR/WEEKLY/01",
            "document_name": null,
            "company_entity_id": null,
            "verified": false,
            "metadata": { "holder_name": "Big Farm Co", "address": ["1 River Lane"] },
        }))))
        .mount(&backends.crm)
        .await;
    // A verified document with the same holder: the affinity shortcut
    // applies to the whole selection.
    Mock::given(method("POST"))
        .and(path("/documentHeader/filter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([{
            "document_id": Uuid::new_v4(),
            "system_external_id": "AT/CURR/DAILY/01",
            "document_name": null,
            "company_entity_id": company_id,
            "verified": true,
            "metadata": { "holder_name": "big farm co", "address": [] },
        }]))))
        .mount(&backends.crm)
        .await;
    Mock::given(method("POST"))
        .and(path("/documentHeader/verify"))
        .and(body_partial_json(json!({ "company_entity_id": company_id })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backends.crm)
        .await;

    let app = router(backends.state.clone());
    let form = format!("documents={document_id}&csrf_token={}", session.csrf_token);
    let response = app
        .clone()
        .oneshot(
            Request::post("/select-licences")
                .header(header::COOKIE, format!("session={cookie}"))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Licences added"));

    // The flow is finished: going back must not re-offer the claimed
    // documents.
    let response = app
        .oneshot(
            Request::get("/select-licences")
                .header(header::COOKIE, format!("session={cookie}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/add-licences");
}
