use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, HeaderValue};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assert_matches::assert_matches;

use auth_cell::handlers::*;
use auth_cell::models::{LoginRequest, SignupRequest};
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

fn signup_request(email: &str, role: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        password: "correct-horse-battery".to_string(),
        role: role.to_string(),
    }
}

#[tokio::test]
async fn signup_rejects_email_without_at_sign() {
    let config = TestConfig::default().to_arc();

    let result = signup(
        State(config),
        Json(signup_request("not-an-email", "patient")),
    )
    .await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn signup_rejects_unknown_roles() {
    let config = TestConfig::default().to_arc();

    let result = signup(
        State(config),
        Json(signup_request("jane@example.com", "admin")),
    )
    .await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn signup_stores_the_role_in_user_metadata() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "jane@example.com",
            "user_metadata": { "role": "patient" }
        })))
        .mount(&mock_server)
        .await;

    let result = signup(
        State(config),
        Json(signup_request("jane@example.com", "patient")),
    )
    .await
    .unwrap();

    assert_eq!(result.0["role"], "patient");
    assert_eq!(result.0["user"]["user_metadata"]["role"], "patient");
}

#[tokio::test]
async fn signup_with_a_taken_email_is_already_exists() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "msg": "User already registered"
        })))
        .mount(&mock_server)
        .await;

    let result = signup(
        State(config),
        Json(signup_request("jane@example.com", "patient")),
    )
    .await;

    assert_matches!(result, Err(AppError::AlreadyExists(_)));
}

#[tokio::test]
async fn login_surfaces_the_role_from_user_metadata() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-here",
            "token_type": "bearer",
            "user": {
                "id": "user-1",
                "email": "smith@example.com",
                "user_metadata": { "role": "doctor" }
            }
        })))
        .mount(&mock_server)
        .await;

    let result = login(
        State(config),
        Json(LoginRequest {
            email: "smith@example.com".to_string(),
            password: "correct-horse-battery".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(result.0["role"], "doctor");
    assert_eq!(result.0["session"]["access_token"], "jwt-here");
}

#[tokio::test]
async fn login_with_bad_credentials_is_an_auth_error() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_arc();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&mock_server)
        .await;

    let result = login(
        State(config),
        Json(LoginRequest {
            email: "smith@example.com".to_string(),
            password: "wrong".to_string(),
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::Auth(_)));
}

#[tokio::test]
async fn validate_reports_the_token_identity() {
    let test_config = TestConfig::default();
    let config: Arc<AppConfig> = test_config.to_arc();
    let user = TestUser::patient("jane@example.com");
    let token = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, Some(1));

    let result = validate_token(State(config), bearer_headers(&token))
        .await
        .unwrap();

    assert!(result.0.valid);
    assert_eq!(result.0.user_id, user.id);
    assert_eq!(result.0.role, Some("patient".to_string()));
}

#[tokio::test]
async fn validate_rejects_expired_tokens() {
    let test_config = TestConfig::default();
    let config: Arc<AppConfig> = test_config.to_arc();
    let user = TestUser::patient("jane@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &test_config.jwt_secret);

    let result = validate_token(State(config), bearer_headers(&token)).await;

    assert_matches!(result, Err(AppError::Auth(_)));
}

#[tokio::test]
async fn validate_requires_a_bearer_header() {
    let config = TestConfig::default().to_arc();

    let result = validate_token(State(config), HeaderMap::new()).await;

    assert_matches!(result, Err(AppError::Auth(_)));
}

#[tokio::test]
async fn verify_answers_false_for_a_bad_signature() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::patient("jane@example.com");
    let token = JwtTestUtils::create_invalid_signature_token(&user);

    let result = verify_token(State(config), bearer_headers(&token))
        .await
        .unwrap();

    assert_eq!(result.0["valid"], false);
}

#[tokio::test]
async fn verify_answers_true_for_a_valid_token() {
    let test_config = TestConfig::default();
    let config: Arc<AppConfig> = test_config.to_arc();
    let user = TestUser::doctor("smith@example.com");
    let token = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, Some(1));

    let result = verify_token(State(config), bearer_headers(&token))
        .await
        .unwrap();

    assert_eq!(result.0["valid"], true);
}
