use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Descriptive record attached one-to-one to a doctor identity.
/// `user_id` carries a unique constraint, same as patient profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub specialty: String,
    pub bio: Option<String>,
    pub years_experience: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorProfileRequest {
    pub name: String,
    pub specialty: String,
    pub bio: Option<String>,
    pub years_experience: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorProfileRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub years_experience: Option<i32>,
}

/// Public directory search: substring match over name and specialty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSearchQuery {
    pub name: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor profile not found")]
    NotFound,

    #[error("Doctor profile already exists")]
    AlreadyExists,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
