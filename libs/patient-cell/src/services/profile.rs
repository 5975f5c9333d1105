use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};

use crate::models::{
    CreatePatientProfileRequest, PatientProfile, ProfileError, UpdatePatientProfileRequest,
};

impl From<SupabaseError> for ProfileError {
    fn from(e: SupabaseError) -> Self {
        match e {
            SupabaseError::Conflict(_) => ProfileError::AlreadyExists,
            SupabaseError::NotFound(_) => ProfileError::NotFound,
            other => ProfileError::DatabaseError(other.to_string()),
        }
    }
}

pub struct PatientProfileService {
    supabase: SupabaseClient,
}

impl PatientProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Look up the profile owned by an identity, if any.
    pub async fn find_profile_by_user(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Option<PatientProfile>, ProfileError> {
        let path = format!(
            "/rest/v1/patient_profiles?user_id=eq.{}",
            urlencoding::encode(user_id)
        );
        let mut rows: Vec<PatientProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Look up a profile by its primary key.
    pub async fn get_profile(
        &self,
        profile_id: &uuid::Uuid,
        auth_token: &str,
    ) -> Result<PatientProfile, ProfileError> {
        let path = format!("/rest/v1/patient_profiles?id=eq.{}", profile_id);
        let mut rows: Vec<PatientProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            return Err(ProfileError::NotFound);
        }
        Ok(rows.remove(0))
    }

    /// Create the caller's profile. At most one profile per identity: the
    /// pre-check gives a friendly error on the common path, and the unique
    /// constraint on `user_id` settles the concurrent race (409 -> AlreadyExists).
    pub async fn create_profile(
        &self,
        user_id: &str,
        request: CreatePatientProfileRequest,
        auth_token: &str,
    ) -> Result<PatientProfile, ProfileError> {
        debug!("Creating patient profile for user {}", user_id);

        if request.full_name.trim().is_empty() {
            return Err(ProfileError::ValidationError(
                "full_name must not be empty".to_string(),
            ));
        }

        if self.find_profile_by_user(user_id, auth_token).await?.is_some() {
            return Err(ProfileError::AlreadyExists);
        }

        let profile_data = json!({
            "user_id": user_id,
            "full_name": request.full_name,
            "age": request.age,
            "gender": request.gender,
            "medical_history": request.medical_history,
        });

        let profile = self
            .supabase
            .insert_returning("/rest/v1/patient_profiles", auth_token, profile_data)
            .await?;

        Ok(profile)
    }

    /// Partial update of the caller's own profile. The row is addressed by
    /// the caller's user id, so a non-owner can never reach another row.
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdatePatientProfileRequest,
        auth_token: &str,
    ) -> Result<PatientProfile, ProfileError> {
        debug!("Updating patient profile for user {}", user_id);

        let mut update_data = serde_json::Map::new();
        if let Some(full_name) = request.full_name {
            if full_name.trim().is_empty() {
                return Err(ProfileError::ValidationError(
                    "full_name must not be empty".to_string(),
                ));
            }
            update_data.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(age) = request.age {
            update_data.insert("age".to_string(), json!(age));
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(history) = request.medical_history {
            update_data.insert("medical_history".to_string(), json!(history));
        }
        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));

        let path = format!(
            "/rest/v1/patient_profiles?user_id=eq.{}",
            urlencoding::encode(user_id)
        );
        let mut rows: Vec<PatientProfile> = self
            .supabase
            .update_returning(&path, auth_token, Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(ProfileError::NotFound);
        }
        Ok(rows.remove(0))
    }
}
