//! Integration tests for self-registration and the password-reset flows,
//! including the no-enumeration behaviour.

mod common;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{envelope, setup};
use water_abstraction_ui::common::error::AppError;

fn idm_user(user_id: Uuid, email: &str, external_id: Option<Uuid>) -> serde_json::Value {
    json!({
        "user_id": user_id,
        "user_name": email,
        "external_id": external_id,
        "reset_required": false,
        "reset_guid": null,
        "last_login": null,
        "role": { "scopes": ["external"] },
        "user_data": {},
    })
}

#[tokio::test]
async fn registering_creates_the_account_and_sends_the_email() {
    let backends = setup().await;
    let email = "applicant@example.com";

    // Email is normalized before the account is created.
    Mock::given(method("POST"))
        .and(path("/user"))
        .and(body_partial_json(json!({ "user_name": email })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(idm_user(Uuid::new_v4(), email, None))),
        )
        .expect(1)
        .mount(&backends.idm)
        .await;
    Mock::given(method("POST"))
        .and(path("/notify/new_registration_email"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backends.notify)
        .await;

    let user = backends
        .state
        .registration_service
        .register(" Applicant@Example.COM ")
        .await
        .unwrap();
    assert_eq!(user.user_name, email);
}

#[tokio::test]
async fn a_duplicate_email_surfaces_as_already_registered() {
    let backends = setup().await;

    Mock::given(method("POST"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&backends.idm)
        .await;
    Mock::given(method("POST"))
        .and(path("/notify/new_registration_email"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&backends.notify)
        .await;

    let result = backends
        .state
        .registration_service
        .register("taken@example.com")
        .await;

    assert!(matches!(result, Err(AppError::EmailAlreadyExists)));
}

#[tokio::test]
async fn a_failed_registration_email_does_not_fail_the_registration() {
    let backends = setup().await;
    let email = "applicant@example.com";

    Mock::given(method("POST"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(idm_user(Uuid::new_v4(), email, None))),
        )
        .mount(&backends.idm)
        .await;
    Mock::given(method("POST"))
        .and(path("/notify/new_registration_email"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backends.notify)
        .await;

    // The account exists; the email can be re-sent from /send-again.
    assert!(backends
        .state
        .registration_service
        .register(email)
        .await
        .is_ok());
}

#[tokio::test]
async fn send_again_is_silent_for_unknown_addresses() {
    let backends = setup().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .mount(&backends.idm)
        .await;
    // No email goes out, and no error reveals the address is unknown.
    Mock::given(method("POST"))
        .and(path("/notify/new_registration_email"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&backends.notify)
        .await;

    backends
        .state
        .registration_service
        .send_again("nobody@example.com")
        .await
        .unwrap();
}

#[tokio::test]
async fn send_again_resends_for_known_addresses() {
    let backends = setup().await;
    let email = "applicant@example.com";

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!([idm_user(Uuid::new_v4(), email, None)]))),
        )
        .mount(&backends.idm)
        .await;
    Mock::given(method("POST"))
        .and(path("/notify/new_registration_email"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backends.notify)
        .await;

    backends
        .state
        .registration_service
        .send_again(email)
        .await
        .unwrap();
}

#[tokio::test]
async fn reset_requests_never_reveal_whether_the_account_exists() {
    let backends = setup().await;

    // IDM answers 404 for an unknown address; the caller sees success.
    Mock::given(method("POST"))
        .and(path("/reset/nobody@example.com"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&backends.idm)
        .await;

    backends
        .state
        .registration_service
        .start_password_reset("nobody@example.com")
        .await
        .unwrap();
}

#[tokio::test]
async fn changing_the_password_consumes_the_guid_and_signs_the_user_in() {
    let backends = setup().await;
    let user_id = Uuid::new_v4();
    let entity_id = Uuid::new_v4();
    let email = "holder@example.com";
    let guid = "9f3d1c2a-reset-guid";

    Mock::given(method("GET"))
        .and(path(format!("/reset/{guid}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(idm_user(user_id, email, Some(entity_id)))),
        )
        .expect(1)
        .mount(&backends.idm)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/reset/{guid}/password")))
        .and(body_partial_json(json!({ "password": "correct-horse-battery" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backends.idm)
        .await;

    let signed_in_email = backends
        .state
        .registration_service
        .change_password(guid, "correct-horse-battery")
        .await
        .unwrap();
    assert_eq!(signed_in_email, email);

    // Proof of mailbox ownership doubles as authentication: the returned
    // email feeds straight into the sign-in orchestration.
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!([idm_user(user_id, email, Some(entity_id))]))),
        )
        .mount(&backends.idm)
        .await;
    Mock::given(method("GET"))
        .and(path("/entity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([{
            "entity_id": entity_id,
            "entity_nm": email,
            "entity_type": "individual",
        }]))))
        .mount(&backends.crm)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/entity/{entity_id}/roles")))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .mount(&backends.crm)
        .await;

    let signed = backends
        .state
        .auth_service
        .sign_in_automatically(&signed_in_email, None)
        .await
        .unwrap();
    assert_eq!(signed.session.user_name, email);
}

#[tokio::test]
async fn an_unknown_reset_guid_is_rejected() {
    let backends = setup().await;

    Mock::given(method("GET"))
        .and(path("/reset/bogus-guid"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&backends.idm)
        .await;

    let result = backends
        .state
        .registration_service
        .change_password("bogus-guid", "correct-horse-battery")
        .await;

    assert!(matches!(result, Err(AppError::NotFound)));
}
