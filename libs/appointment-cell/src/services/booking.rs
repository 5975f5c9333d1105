use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};
use shared_models::auth::{Role, User};

use doctor_cell::models::DoctorError;
use doctor_cell::services::DoctorService;
use patient_cell::models::ProfileError;
use patient_cell::services::PatientProfileService;

use crate::models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    ParticipantRole,
};
use crate::services::lifecycle::AppointmentLifecycleService;

impl From<SupabaseError> for AppointmentError {
    fn from(e: SupabaseError) -> Self {
        match e {
            SupabaseError::NotFound(_) => AppointmentError::NotFound,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ProfileError> for AppointmentError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::NotFound => AppointmentError::PatientProfileMissing,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppointmentError::DoctorNotFound,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

/// The appointment engine: booking, participant-scoped reads, and guarded
/// status transitions.
pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    patients: PatientProfileService,
    doctors: DoctorService,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            patients: PatientProfileService::new(config),
            doctors: DoctorService::new(config),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book an appointment for the calling patient.
    ///
    /// The patient reference is always the caller's own profile; the write
    /// model has no field for a patient id, so booking on another patient's
    /// behalf is structurally impossible.
    pub async fn create_appointment(
        &self,
        user: &User,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentDetails, AppointmentError> {
        info!("Booking appointment with doctor {}", request.doctor_id);

        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "reason must not be empty".to_string(),
            ));
        }

        let patient = self
            .patients
            .find_profile_by_user(&user.id, auth_token)
            .await?
            .ok_or(AppointmentError::PatientProfileMissing)?;

        let doctor = self.doctors.get_doctor(&request.doctor_id, auth_token).await?;

        let appointment_data = json!({
            "patient_id": patient.id,
            "doctor_id": doctor.id,
            "date": request.date,
            "time": request.time,
            "status": AppointmentStatus::Pending.to_string(),
            "reason": request.reason,
        });

        let appointment: Appointment = self
            .supabase
            .insert_returning("/rest/v1/appointments", auth_token, appointment_data)
            .await?;

        info!("Appointment {} booked with doctor {}", appointment.id, doctor.id);

        Ok(AppointmentDetails::assemble(appointment, patient, doctor))
    }

    /// List the caller's appointments: only those where the caller is the
    /// patient or the doctor of record, ordered by date then time.
    pub async fn list_appointments(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = match user.role() {
            Some(Role::Patient) => {
                match self.patients.find_profile_by_user(&user.id, auth_token).await? {
                    Some(profile) => format!("patient_id=eq.{}", profile.id),
                    None => return Ok(vec![]),
                }
            }
            Some(Role::Doctor) => {
                match self.doctors.find_profile_by_user(&user.id, auth_token).await? {
                    Some(profile) => format!("doctor_id=eq.{}", profile.id),
                    None => return Ok(vec![]),
                }
            }
            None => return Ok(vec![]),
        };

        let path = format!(
            "/rest/v1/appointments?{}&order=date.asc,time.asc",
            filter
        );
        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(appointments)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            return Err(AppointmentError::NotFound);
        }
        Ok(rows.remove(0))
    }

    /// Expand an appointment row into the read model with nested profiles.
    pub async fn expand(
        &self,
        appointment: Appointment,
        auth_token: &str,
    ) -> Result<AppointmentDetails, AppointmentError> {
        let patient = self
            .patients
            .get_profile(&appointment.patient_id, auth_token)
            .await
            .map_err(|e| match e {
                ProfileError::NotFound => {
                    AppointmentError::DatabaseError("Appointment references missing patient".into())
                }
                other => other.into(),
            })?;
        let doctor = self.doctors.get_doctor(&appointment.doctor_id, auth_token).await?;

        Ok(AppointmentDetails::assemble(appointment, patient, doctor))
    }

    /// Determine which side of the appointment the caller is on, by
    /// resolving the caller's own profile and comparing references.
    pub async fn participant_role(
        &self,
        user: &User,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Result<ParticipantRole, AppointmentError> {
        match user.role() {
            Some(Role::Patient) => {
                let profile = self
                    .patients
                    .find_profile_by_user(&user.id, auth_token)
                    .await?;
                match profile {
                    Some(p) if p.id == appointment.patient_id => Ok(ParticipantRole::Patient),
                    _ => Err(AppointmentError::NotParticipant),
                }
            }
            Some(Role::Doctor) => {
                let profile = self
                    .doctors
                    .find_profile_by_user(&user.id, auth_token)
                    .await?;
                match profile {
                    Some(d) if d.id == appointment.doctor_id => Ok(ParticipantRole::Doctor),
                    _ => Err(AppointmentError::NotParticipant),
                }
            }
            None => Err(AppointmentError::NotParticipant),
        }
    }

    /// Transition an appointment's status on behalf of a participant.
    ///
    /// The PATCH is guarded by the expected current status, so two
    /// conflicting transitions cannot both succeed: the loser matches zero
    /// rows and surfaces as an invalid transition.
    pub async fn update_status(
        &self,
        user: &User,
        appointment_id: &Uuid,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<AppointmentDetails, AppointmentError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;
        let actor = self.participant_role(user, &appointment, auth_token).await?;

        self.lifecycle.validate(actor, &appointment.status, &new_status)?;

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id, appointment.status
        );
        let update_data = json!({
            "status": new_status.to_string(),
            "updated_at": chrono::Utc::now().to_rfc3339(),
        });

        let mut rows: Vec<Appointment> = self
            .supabase
            .update_returning(&path, auth_token, update_data)
            .await?;

        if rows.is_empty() {
            // Lost the race: the row moved off the status we validated against.
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: new_status,
            });
        }

        let updated = rows.remove(0);
        info!(
            "Appointment {} moved {} -> {} by {}",
            appointment_id, appointment.status, updated.status, actor
        );

        self.expand(updated, auth_token).await
    }

    /// Cancel an appointment: a participant-driven transition to
    /// `cancelled`, never a deletion.
    pub async fn cancel_appointment(
        &self,
        user: &User,
        appointment_id: &Uuid,
        auth_token: &str,
    ) -> Result<AppointmentDetails, AppointmentError> {
        self.update_status(user, appointment_id, AppointmentStatus::Cancelled, auth_token)
            .await
    }
}
