use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserType;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub iat: Option<u64>,
}

/// Verified request identity, built from validated token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: UserType,
}

/// Body returned by a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Body returned by the token validation endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenStatus {
    pub valid: bool,
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserType,
}
