use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest, UpdateStatusRequest};
use crate::services::booking::AppointmentBookingService;

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::PatientProfileMissing => {
            AppError::NotFound("Create a patient profile before booking".to_string())
        }
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::NotParticipant => {
            AppError::NotOwner("Not a participant in this appointment".to_string())
        }
        AppointmentError::InvalidTransition { from, to } => AppError::InvalidTransition(format!(
            "Cannot transition appointment from {} to {}",
            from, to
        )),
        AppointmentError::TransitionNotAllowed { actor, to } => AppError::RoleMismatch(format!(
            "The {} of record may not set status to {}",
            actor, to
        )),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Book an appointment. Patient-only; the patient of record is always the
/// caller.
#[axum::debug_handler]
pub async fn create_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    user.require_role(Role::Patient)?;

    let service = AppointmentBookingService::new(&config);

    let appointment = service
        .create_appointment(&user, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

/// List the caller's appointments (as patient or doctor of record).
#[axum::debug_handler]
pub async fn list_my_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&config);

    let appointments = service
        .list_appointments(&user, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

/// Participant-only detail view with nested profiles.
#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&config);

    let appointment = service
        .get_appointment(&appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    service
        .participant_role(&user, &appointment, auth.token())
        .await
        .map_err(map_appointment_error)?;

    let details = service
        .expand(appointment, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(details)))
}

/// Transition an appointment's status. Who may drive which transition is
/// decided by the lifecycle service's authorization matrix.
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(config): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&config);

    let appointment = service
        .update_status(&user, &appointment_id, request.status, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment status updated successfully"
    })))
}

/// Cancel an appointment (participant-only status transition, not a
/// deletion).
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&config);

    let appointment = service
        .cancel_appointment(&user, &appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}
