use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::models::{
    CreateDoctorProfileRequest, DoctorError, DoctorSearchQuery, UpdateDoctorProfileRequest,
};
use crate::services::DoctorService;

fn map_doctor_error(e: DoctorError) -> AppError {
    match e {
        DoctorError::NotFound => AppError::NotFound("Doctor profile not found".to_string()),
        DoctorError::AlreadyExists => {
            AppError::AlreadyExists("Profile already exists. Use update instead".to_string())
        }
        DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Create the calling doctor's profile.
#[axum::debug_handler]
pub async fn create_doctor_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    user.require_role(Role::Doctor)?;

    let service = DoctorService::new(&config);

    let profile = service
        .create_profile(&user.id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "profile": profile,
        "message": "Doctor profile created successfully"
    })))
}

/// Update the calling doctor's own profile.
#[axum::debug_handler]
pub async fn update_doctor_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    user.require_role(Role::Doctor)?;

    let service = DoctorService::new(&config);

    let profile = service
        .update_profile(&user.id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "profile": profile,
        "message": "Doctor profile updated successfully"
    })))
}

/// Public doctor directory with name/specialty substring search.
#[axum::debug_handler]
pub async fn search_doctors_public(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&config);

    let doctors = service
        .search_doctors(query)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

/// Public doctor detail.
#[axum::debug_handler]
pub async fn get_doctor_public(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&config);

    let doctor = service
        .get_doctor_public(&doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}
