use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};

use crate::models::{
    CreateDoctorProfileRequest, DoctorError, DoctorProfile, DoctorSearchQuery,
    UpdateDoctorProfileRequest,
};

impl From<SupabaseError> for DoctorError {
    fn from(e: SupabaseError) -> Self {
        match e {
            SupabaseError::Conflict(_) => DoctorError::AlreadyExists,
            SupabaseError::NotFound(_) => DoctorError::NotFound,
            other => DoctorError::DatabaseError(other.to_string()),
        }
    }
}

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn find_profile_by_user(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Option<DoctorProfile>, DoctorError> {
        let path = format!(
            "/rest/v1/doctor_profiles?user_id=eq.{}",
            urlencoding::encode(user_id)
        );
        let mut rows: Vec<DoctorProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Resolve a doctor profile by its primary key. The appointment engine
    /// uses this to validate client-supplied doctor references.
    pub async fn get_doctor(
        &self,
        doctor_id: &Uuid,
        auth_token: &str,
    ) -> Result<DoctorProfile, DoctorError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        let path = format!("/rest/v1/doctor_profiles?id=eq.{}", doctor_id);
        let mut rows: Vec<DoctorProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::NotFound);
        }
        Ok(rows.remove(0))
    }

    /// Public doctor detail (anon access).
    pub async fn get_doctor_public(&self, doctor_id: &Uuid) -> Result<DoctorProfile, DoctorError> {
        let path = format!("/rest/v1/doctor_profiles?id=eq.{}", doctor_id);
        let mut rows: Vec<DoctorProfile> =
            self.supabase.request(Method::GET, &path, None, None).await?;

        if rows.is_empty() {
            return Err(DoctorError::NotFound);
        }
        Ok(rows.remove(0))
    }

    pub async fn create_profile(
        &self,
        user_id: &str,
        request: CreateDoctorProfileRequest,
        auth_token: &str,
    ) -> Result<DoctorProfile, DoctorError> {
        debug!("Creating doctor profile for user {}", user_id);

        if request.name.trim().is_empty() || request.specialty.trim().is_empty() {
            return Err(DoctorError::ValidationError(
                "name and specialty must not be empty".to_string(),
            ));
        }

        if self.find_profile_by_user(user_id, auth_token).await?.is_some() {
            return Err(DoctorError::AlreadyExists);
        }

        let profile_data = json!({
            "user_id": user_id,
            "name": request.name,
            "specialty": request.specialty,
            "bio": request.bio,
            "years_experience": request.years_experience,
        });

        let profile = self
            .supabase
            .insert_returning("/rest/v1/doctor_profiles", auth_token, profile_data)
            .await?;

        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateDoctorProfileRequest,
        auth_token: &str,
    ) -> Result<DoctorProfile, DoctorError> {
        debug!("Updating doctor profile for user {}", user_id);

        let mut update_data = serde_json::Map::new();
        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(DoctorError::ValidationError(
                    "name must not be empty".to_string(),
                ));
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(specialty) = request.specialty {
            update_data.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(bio) = request.bio {
            update_data.insert("bio".to_string(), json!(bio));
        }
        if let Some(experience) = request.years_experience {
            update_data.insert("years_experience".to_string(), json!(experience));
        }
        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));

        let path = format!(
            "/rest/v1/doctor_profiles?user_id=eq.{}",
            urlencoding::encode(user_id)
        );
        let mut rows: Vec<DoctorProfile> = self
            .supabase
            .update_returning(&path, auth_token, Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::NotFound);
        }
        Ok(rows.remove(0))
    }

    /// Public directory listing with substring filters over name/specialty.
    pub async fn search_doctors(
        &self,
        query: DoctorSearchQuery,
    ) -> Result<Vec<DoctorProfile>, DoctorError> {
        debug!("Searching doctors: {:?}", query);

        let mut query_parts: Vec<String> = Vec::new();
        if let Some(name) = query.name {
            query_parts.push(format!("name=ilike.%{}%", urlencoding::encode(&name)));
        }
        if let Some(specialty) = query.specialty {
            query_parts.push(format!(
                "specialty=ilike.%{}%",
                urlencoding::encode(&specialty)
            ));
        }
        query_parts.push("order=name.asc".to_string());

        let path = format!("/rest/v1/doctor_profiles?{}", query_parts.join("&"));
        let doctors: Vec<DoctorProfile> =
            self.supabase.request(Method::GET, &path, None, None).await?;

        Ok(doctors)
    }
}
