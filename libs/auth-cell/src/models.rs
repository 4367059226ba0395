use serde::{Deserialize, Serialize};

use shared_models::user::UserType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub user_type: UserType,
    /// Doctors declare their working hours up front, e.g. "09:00-17:00".
    pub available_timeslots: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Mobile number already registered")]
    MobileTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to issue token: {0}")]
    TokenIssue(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
