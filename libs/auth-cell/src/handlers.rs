use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::HeaderMap,
};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};
use shared_models::auth::{Role, TokenResponse};
use shared_models::error::AppError;
use shared_utils::jwt::validate_token as validate_jwt;

use crate::models::{LoginRequest, SignupRequest};

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

/// Register a new identity with a fixed role. The role is stored in the
/// identity provider's user metadata and surfaces in every JWT thereafter.
#[axum::debug_handler]
pub async fn signup(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Registering new {} account", request.role);

    if !request.email.contains('@') {
        return Err(AppError::ValidationError(
            "Enter a valid email address with an '@'".to_string(),
        ));
    }

    let role: Role = request
        .role
        .parse()
        .map_err(|_| AppError::ValidationError("Role must be 'patient' or 'doctor'".to_string()))?;

    let client = SupabaseClient::new(&config);

    let signup_body = json!({
        "email": request.email,
        "password": request.password,
        "data": { "role": role.to_string() }
    });

    let response: Value = client
        .request(Method::POST, "/auth/v1/signup", None, Some(signup_body))
        .await
        .map_err(|e| match e {
            SupabaseError::Conflict(_) => {
                AppError::AlreadyExists("An account with this email already exists".to_string())
            }
            SupabaseError::Api { status, message } if status < 500 => AppError::BadRequest(message),
            other => AppError::ExternalService(other.to_string()),
        })?;

    Ok(Json(json!({
        "user": response,
        "role": role,
        "message": "Account registered successfully"
    })))
}

/// Password login. The response carries the caller's role alongside the
/// provider's token payload.
#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Logging in {}", request.email);

    let client = SupabaseClient::new(&config);

    let login_body = json!({
        "email": request.email,
        "password": request.password,
    });

    let response: Value = client
        .request(
            Method::POST,
            "/auth/v1/token?grant_type=password",
            None,
            Some(login_body),
        )
        .await
        .map_err(|e| match e {
            SupabaseError::Auth(_) => AppError::Auth("Invalid email or password".to_string()),
            SupabaseError::Api { status, message } if status < 500 => AppError::Auth(message),
            other => AppError::ExternalService(other.to_string()),
        })?;

    let role = response
        .get("user")
        .and_then(|u| u.get("user_metadata"))
        .and_then(|m| m.get("role"))
        .cloned()
        .unwrap_or(Value::Null);

    Ok(Json(json!({
        "session": response,
        "role": role,
    })))
}

/// Validate the bearer token locally and report the caller's identity.
pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;

    match validate_jwt(&token, &config.supabase_jwt_secret) {
        Ok(user) => Ok(Json(TokenResponse {
            valid: true,
            user_id: user.id,
            email: user.email,
            role: user.role,
        })),
        Err(err) => Err(AppError::Auth(err)),
    }
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;

    match validate_jwt(&token, &config.supabase_jwt_secret) {
        Ok(_) => Ok(Json(json!({ "valid": true }))),
        Err(_) => Ok(Json(json!({ "valid": false }))),
    }
}
