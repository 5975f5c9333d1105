use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::models::{CreatePatientProfileRequest, ProfileError, UpdatePatientProfileRequest};
use crate::services::PatientProfileService;

fn map_profile_error(e: ProfileError) -> AppError {
    match e {
        ProfileError::NotFound => AppError::NotFound("Patient profile does not exist".to_string()),
        ProfileError::AlreadyExists => {
            AppError::AlreadyExists("Profile already exists. Use update instead".to_string())
        }
        ProfileError::ValidationError(msg) => AppError::ValidationError(msg),
        ProfileError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Create the calling patient's profile.
#[axum::debug_handler]
pub async fn create_patient_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePatientProfileRequest>,
) -> Result<Json<Value>, AppError> {
    user.require_role(Role::Patient)?;

    let service = PatientProfileService::new(&config);

    let profile = service
        .create_profile(&user.id, request, auth.token())
        .await
        .map_err(map_profile_error)?;

    Ok(Json(json!({
        "profile": profile,
        "message": "Patient profile created successfully"
    })))
}

/// Update the calling patient's own profile.
#[axum::debug_handler]
pub async fn update_patient_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePatientProfileRequest>,
) -> Result<Json<Value>, AppError> {
    user.require_role(Role::Patient)?;

    let service = PatientProfileService::new(&config);

    let profile = service
        .update_profile(&user.id, request, auth.token())
        .await
        .map_err(map_profile_error)?;

    Ok(Json(json!({
        "profile": profile,
        "message": "Patient profile updated successfully"
    })))
}

/// View the calling patient's own profile.
#[axum::debug_handler]
pub async fn get_own_patient_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    user.require_role(Role::Patient)?;

    let service = PatientProfileService::new(&config);

    let profile = service
        .find_profile_by_user(&user.id, auth.token())
        .await
        .map_err(map_profile_error)?
        .ok_or_else(|| AppError::NotFound("Patient profile does not exist".to_string()))?;

    Ok(Json(json!(profile)))
}
