use chrono::Utc;
use regex::Regex;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{DbError, SupabaseClient};
use shared_models::auth::TokenResponse;
use shared_models::user::{User, UserProfile};
use shared_utils::{jwt, password};

use crate::models::{AuthError, LoginRequest, RegisterRequest};

const MIN_PASSWORD_LENGTH: usize = 8;

pub struct AccountService {
    db: Arc<SupabaseClient>,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AuthError> {
        debug!("Registering user {}", request.email);

        validate_registration(&request)?;

        if self.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        if self.find_by_mobile(&request.mobile).await?.is_some() {
            return Err(AuthError::MobileTaken);
        }

        let hashed_password =
            password::hash_password(&request.password).map_err(AuthError::Validation)?;

        let payload = json!({
            "full_name": request.full_name,
            "email": request.email,
            "mobile": request.mobile,
            "user_type": request.user_type,
            "available_timeslots": request.available_timeslots,
            "profile_image": request.profile_image,
            "is_active": true,
            "hashed_password": hashed_password,
            "created_at": Utc::now().to_rfc3339(),
        });

        let rows = self
            .db
            .write_returning(Method::POST, "/rest/v1/users", payload)
            .await
            .map_err(|e| match e {
                // Unique constraint fired between our pre-checks and the insert.
                DbError::Conflict(_) => {
                    AuthError::Validation("Email or mobile already registered".to_string())
                }
                other => AuthError::DatabaseError(other.to_string()),
            })?;

        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::DatabaseError("Insert returned no rows".to_string()))?;

        let user: User = serde_json::from_value(created)
            .map_err(|e| AuthError::DatabaseError(format!("Failed to parse user: {}", e)))?;

        info!("Registered {} as {}", user.email, user.user_type);
        Ok(user.into())
    }

    pub async fn login(
        &self,
        request: LoginRequest,
        jwt_secret: &str,
    ) -> Result<TokenResponse, AuthError> {
        debug!("Login attempt for {}", request.email);

        let user = self
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(&request.password, &user.hashed_password) {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = jwt::issue_token(user.id, &user.email, user.user_type, jwt_secret)
            .map_err(AuthError::TokenIssue)?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let path = format!("/rest/v1/users?email=eq.{}", urlencoding::encode(email));
        self.find_one(&path).await
    }

    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<User>, AuthError> {
        let path = format!("/rest/v1/users?mobile=eq.{}", urlencoding::encode(mobile));
        self.find_one(&path).await
    }

    async fn find_one(&self, path: &str) -> Result<Option<User>, AuthError> {
        let rows: Vec<User> = self
            .db
            .request(Method::GET, path, None)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next())
    }
}

fn validate_registration(request: &RegisterRequest) -> Result<(), AuthError> {
    if request.full_name.trim().is_empty() || request.full_name.len() > 100 {
        return Err(AuthError::Validation(
            "Full name must be between 1 and 100 characters".to_string(),
        ));
    }

    let email_format = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex");
    if !email_format.is_match(&request.email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    // 11-14 digits, optionally with a country-code prefix.
    let mobile_format = Regex::new(r"^\+?[0-9]{11,14}$").expect("static regex");
    if !mobile_format.is_match(&request.mobile) {
        return Err(AuthError::Validation("Invalid mobile number".to_string()));
    }

    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    Ok(())
}
