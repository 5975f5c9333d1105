use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::models::DoctorProfile;
use patient_cell::models::PatientProfile;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Which side of the appointment the caller is on. Derived from the
/// caller's own profile, never from the request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Patient,
    Doctor,
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRole::Patient => write!(f, "patient"),
            ParticipantRole::Doctor => write!(f, "doctor"),
        }
    }
}

/// Persisted appointment row. `patient_id` and `doctor_id` reference
/// profile rows, not auth identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model returned by write endpoints: the row with both profiles
/// expanded. The write model (`BookAppointmentRequest`) deliberately has a
/// different shape and accepts only a doctor reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub id: Uuid,
    pub patient: PatientProfile,
    pub doctor: DoctorProfile,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentDetails {
    pub fn assemble(
        appointment: Appointment,
        patient: PatientProfile,
        doctor: DoctorProfile,
    ) -> Self {
        Self {
            id: appointment.id,
            patient,
            doctor,
            date: appointment.date,
            time: appointment.time,
            status: appointment.status,
            reason: appointment.reason,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

/// Write model for booking. The patient reference is never client-supplied;
/// it is resolved from the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient profile does not exist")]
    PatientProfileMissing,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Caller is not a participant in this appointment")]
    NotParticipant,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("The {actor} of record may not set status to {to}")]
    TransitionNotAllowed {
        actor: ParticipantRole,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
