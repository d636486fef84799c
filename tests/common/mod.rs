//! Shared test harness: one mock server per backend service, wired into a
//! real AppState.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;
use wiremock::MockServer;

use water_abstraction_ui::config::{AppState, Config};
use water_abstraction_ui::models::crm::EntityRole;
use water_abstraction_ui::models::session::{Session, SessionClaims};

pub const TEST_COOKIE_SECRET: &str = "test-cookie-secret";

pub struct TestBackends {
    pub state: AppState,
    pub idm: MockServer,
    pub crm: MockServer,
    pub permit: MockServer,
    pub notify: MockServer,
    pub water: MockServer,
}

pub async fn setup() -> TestBackends {
    let idm = MockServer::start().await;
    let crm = MockServer::start().await;
    let permit = MockServer::start().await;
    let notify = MockServer::start().await;
    let water = MockServer::start().await;

    let config = Config {
        port: 0,
        cookie_name: "session".into(),
        cookie_secret: TEST_COOKIE_SECRET.into(),
        session_ttl_hours: 2,
        secure_cookies: false,
        holding_page_enabled: false,
        holding_page_redirect: String::new(),
        idm_url: idm.uri(),
        crm_url: crm.uri(),
        permit_url: permit.uri(),
        notify_url: notify.uri(),
        water_url: water.uri(),
        service_token: "test-token".into(),
    };

    TestBackends {
        state: AppState::from_config(config),
        idm,
        crm,
        permit,
        notify,
        water,
    }
}

/// An already-signed-in external session acting for a single company.
pub fn external_session(entity_id: Uuid, company_entity_id: Uuid) -> Session {
    Session {
        session_id: Uuid::new_v4(),
        csrf_token: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        user_name: "holder@example.com".into(),
        entity_id,
        user_data: serde_json::json!({}),
        last_login: None,
        roles: vec![EntityRole {
            entity_role_id: Uuid::new_v4(),
            entity_id,
            company_entity_id,
            role: "primary_user".into(),
            created_at: None,
        }],
        scope: vec!["external".into(), "primary_user".into()],
        company_entity_id: Some(company_entity_id),
        created_at: Utc::now(),
    }
}

/// An internal caseworker session: base scope only, no company roles.
#[allow(dead_code)]
pub fn internal_session() -> Session {
    Session {
        session_id: Uuid::new_v4(),
        csrf_token: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        user_name: "caseworker@environment-agency.example".into(),
        entity_id: Uuid::new_v4(),
        user_data: serde_json::json!({}),
        last_login: None,
        roles: vec![],
        scope: vec!["internal".into()],
        company_entity_id: None,
        created_at: Utc::now(),
    }
}

/// Park the session in the store and mint the signed cookie value the
/// middleware expects for it.
#[allow(dead_code)]
pub async fn store_session(state: &AppState, session: &Session) -> String {
    state.sessions.create(session.clone()).await.unwrap();
    let now = Utc::now();
    let claims = SessionClaims {
        sid: session.session_id,
        exp: (now + chrono::Duration::hours(2)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_COOKIE_SECRET.as_ref()),
    )
    .unwrap()
}

/// Envelope helper: the `{error, data}` wrapper the services respond with.
pub fn envelope(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "error": null, "data": data })
}
