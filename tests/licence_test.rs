//! Integration tests for licence viewing and renaming.

mod common;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::{envelope, external_session, setup};
use water_abstraction_ui::common::error::AppError;

fn document_body(
    document_id: Uuid,
    licence_number: &str,
    name: Option<&str>,
    company_entity_id: Uuid,
) -> serde_json::Value {
    json!({
        "document_id": document_id,
        "system_external_id": licence_number,
        "document_name": name,
        "company_entity_id": company_entity_id,
        "verified": true,
        "metadata": { "holder_name": "Big Farm Co", "address": [] },
    })
}

#[tokio::test]
async fn licence_detail_joins_the_header_with_the_permit_record() {
    let backends = setup().await;
    let company_id = Uuid::new_v4();
    let session = external_session(Uuid::new_v4(), company_id);
    let document_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/documentHeader/{document_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(document_body(
            document_id,
            "AT/CURR/DAILY/01",
            Some("Borehole licence"),
            company_id,
        ))))
        .mount(&backends.crm)
        .await;

    // Licence refs contain slashes, so the permit lookup uses a query param.
    Mock::given(method("GET"))
        .and(path("/licence"))
        .and(query_param("licence_ref", "AT/CURR/DAILY/01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "licence_ref": "AT/CURR/DAILY/01",
            "licence_data": { "max_daily_volume": 20 },
        }))))
        .mount(&backends.permit)
        .await;

    let (document, permit) = backends
        .state
        .licence_service
        .get_licence(&session, document_id)
        .await
        .unwrap();

    assert_eq!(document.display_name(), "Borehole licence");
    assert_eq!(permit.licence_ref, "AT/CURR/DAILY/01");
    assert_eq!(permit.licence_data["max_daily_volume"], json!(20));
}

#[tokio::test]
async fn another_companys_licence_reads_as_not_found() {
    let backends = setup().await;
    let session = external_session(Uuid::new_v4(), Uuid::new_v4());
    let document_id = Uuid::new_v4();
    let other_company = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/documentHeader/{document_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(document_body(
            document_id,
            "AT/CURR/DAILY/01",
            None,
            other_company,
        ))))
        .mount(&backends.crm)
        .await;

    let result = backends
        .state
        .licence_service
        .get_licence(&session, document_id)
        .await;

    // 404 rather than 403: foreign ids must not be probeable.
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn renaming_trims_the_alias_and_requires_ownership() {
    let backends = setup().await;
    let company_id = Uuid::new_v4();
    let session = external_session(Uuid::new_v4(), company_id);
    let document_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/documentHeader/{document_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(document_body(
            document_id,
            "AT/CURR/DAILY/01",
            None,
            company_id,
        ))))
        .mount(&backends.crm)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/documentHeader/{document_id}")))
        .and(body_partial_json(json!({ "document_name": "Top field" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(document_body(
            document_id,
            "AT/CURR/DAILY/01",
            Some("Top field"),
            company_id,
        ))))
        .expect(1)
        .mount(&backends.crm)
        .await;

    let renamed = backends
        .state
        .licence_service
        .rename_licence(&session, document_id, "  Top field  ")
        .await
        .unwrap();
    assert_eq!(renamed.document_name.as_deref(), Some("Top field"));
}

#[tokio::test]
async fn the_licence_list_only_asks_for_verified_company_documents() {
    let backends = setup().await;
    let company_id = Uuid::new_v4();
    let session = external_session(Uuid::new_v4(), company_id);

    Mock::given(method("POST"))
        .and(path("/documentHeader/filter"))
        .and(body_partial_json(json!({
            "company_entity_id": company_id,
            "verified": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            document_body(Uuid::new_v4(), "AT/CURR/DAILY/01", None, company_id),
            document_body(Uuid::new_v4(), "AT/CURR/WEEKLY/01", Some("Meadow"), company_id),
        ]))))
        .expect(1)
        .mount(&backends.crm)
        .await;

    let licences = backends
        .state
        .licence_service
        .list_licences(&session)
        .await
        .unwrap();

    assert_eq!(licences.len(), 2);
    assert_eq!(licences[0].display_name(), "AT/CURR/DAILY/01");
    assert_eq!(licences[1].display_name(), "Meadow");
}
