use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Caller role, fixed at registration. There is no role-change path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Doctor => write!(f, "doctor"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// Authenticated principal attached to every protected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }

    /// Capability check used by every role-gated operation before any
    /// mutation. Rejections name the required role.
    pub fn require_role(&self, required: Role) -> Result<(), AppError> {
        match self.role() {
            Some(role) if role == required => Ok(()),
            _ => Err(AppError::RoleMismatch(format!(
                "Only {}s can perform this action",
                required
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn user_with_role(role: &str) -> User {
        User {
            id: "user-1".to_string(),
            email: Some("someone@example.com".to_string()),
            role: Some(role.to_string()),
            created_at: None,
        }
    }

    #[test]
    fn require_role_accepts_matching_role() {
        assert!(user_with_role("patient").require_role(Role::Patient).is_ok());
        assert!(user_with_role("doctor").require_role(Role::Doctor).is_ok());
    }

    #[test]
    fn require_role_rejects_other_roles() {
        assert_matches!(
            user_with_role("doctor").require_role(Role::Patient),
            Err(AppError::RoleMismatch(_))
        );
        assert_matches!(
            user_with_role("admin").require_role(Role::Doctor),
            Err(AppError::RoleMismatch(_))
        );
    }

    #[test]
    fn require_role_rejects_missing_role() {
        let mut user = user_with_role("patient");
        user.role = None;
        assert_matches!(user.require_role(Role::Patient), Err(AppError::RoleMismatch(_)));
    }

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("patient".parse::<Role>().unwrap(), Role::Patient);
        assert_eq!(Role::Doctor.to_string(), "doctor");
        assert!("nurse".parse::<Role>().is_err());
    }
}
