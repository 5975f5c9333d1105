use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assert_matches::assert_matches;

use doctor_cell::handlers::*;
use doctor_cell::models::{CreateDoctorProfileRequest, DoctorSearchQuery, UpdateDoctorProfileRequest};
use shared_models::error::AppError;
use shared_utils::test_utils::{TestConfig, TestUser};

fn create_auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer("test-token").unwrap())
}

fn doctor_row(id: Uuid, user_id: &str, name: &str, specialty: &str) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "name": name,
        "specialty": specialty,
        "bio": "Board-certified",
        "years_experience": 8,
        "created_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339()
    })
}

fn create_request(name: &str, specialty: &str) -> CreateDoctorProfileRequest {
    CreateDoctorProfileRequest {
        name: name.to_string(),
        specialty: specialty.to_string(),
        bio: None,
        years_experience: Some(8),
    }
}

#[tokio::test]
async fn patients_cannot_create_doctor_profiles() {
    let config = TestConfig::default().to_arc();
    let patient = TestUser::patient("jane@example.com");

    let result = create_doctor_profile(
        State(config),
        create_auth_header(),
        Extension(patient.to_user()),
        Json(create_request("Dr. Smith", "Neurology")),
    )
    .await;

    assert_matches!(result, Err(AppError::RoleMismatch(_)));
}

#[tokio::test]
async fn create_profile_succeeds_for_a_doctor() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();
    let doctor = TestUser::doctor("smith@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("user_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_profiles"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([doctor_row(
            Uuid::new_v4(),
            &doctor.id,
            "Dr. Smith",
            "Neurology"
        )])))
        .mount(&mock_server)
        .await;

    let result = create_doctor_profile(
        State(config),
        create_auth_header(),
        Extension(doctor.to_user()),
        Json(create_request("Dr. Smith", "Neurology")),
    )
    .await
    .unwrap();

    assert_eq!(result.0["profile"]["name"], "Dr. Smith");
    assert_eq!(result.0["profile"]["specialty"], "Neurology");
}

#[tokio::test]
async fn duplicate_profile_is_already_exists() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();
    let doctor = TestUser::doctor("smith@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("user_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_row(
            Uuid::new_v4(),
            &doctor.id,
            "Dr. Smith",
            "Neurology"
        )])))
        .mount(&mock_server)
        .await;

    let result = create_doctor_profile(
        State(config),
        create_auth_header(),
        Extension(doctor.to_user()),
        Json(create_request("Dr. Smith", "Neurology")),
    )
    .await;

    assert_matches!(result, Err(AppError::AlreadyExists(_)));
}

#[tokio::test]
async fn blank_name_or_specialty_is_rejected() {
    let config = TestConfig::default().to_arc();
    let doctor = TestUser::doctor("smith@example.com");

    let result = create_doctor_profile(
        State(config),
        create_auth_header(),
        Extension(doctor.to_user()),
        Json(create_request("Dr. Smith", "  ")),
    )
    .await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn update_addresses_the_callers_own_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();
    let doctor = TestUser::doctor("smith@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("user_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_row(
            Uuid::new_v4(),
            &doctor.id,
            "Dr. Smith",
            "Cardiology"
        )])))
        .mount(&mock_server)
        .await;

    let result = update_doctor_profile(
        State(config),
        create_auth_header(),
        Extension(doctor.to_user()),
        Json(UpdateDoctorProfileRequest {
            name: None,
            specialty: Some("Cardiology".to_string()),
            bio: None,
            years_experience: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(result.0["profile"]["specialty"], "Cardiology");
}

#[tokio::test]
async fn public_search_filters_by_specialty() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("specialty", "ilike.%Neurology%"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_row(
            Uuid::new_v4(),
            "some-user",
            "Dr. Smith",
            "Neurology"
        )])))
        .mount(&mock_server)
        .await;

    let result = search_doctors_public(
        State(config),
        Query(DoctorSearchQuery {
            name: None,
            specialty: Some("Neurology".to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(result.0["total"], 1);
    assert_eq!(result.0["doctors"][0]["name"], "Dr. Smith");
}

#[tokio::test]
async fn public_detail_returns_the_doctor() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_row(
            doctor_id,
            "some-user",
            "Dr. Smith",
            "Neurology"
        )])))
        .mount(&mock_server)
        .await;

    let result = get_doctor_public(State(config), Path(doctor_id)).await.unwrap();

    assert_eq!(result.0["name"], "Dr. Smith");
}

#[tokio::test]
async fn public_detail_for_unknown_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = get_doctor_public(State(config), Path(doctor_id)).await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}
