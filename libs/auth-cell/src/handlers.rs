use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::TokenStatus;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::models::{AuthError, LoginRequest, RegisterRequest};
use crate::services::account::AccountService;

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(&state);

    let user = account_service.register(request).await.map_err(|e| match e {
        AuthError::EmailTaken | AuthError::MobileTaken | AuthError::Validation(_) => {
            AppError::BadRequest(e.to_string())
        }
        AuthError::DatabaseError(msg) => AppError::Database(msg),
        _ => AppError::Internal(e.to_string()),
    })?;

    Ok(Json(json!({
        "success": true,
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(&state);

    let token = account_service
        .login(request, &state.jwt_secret)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => AppError::Auth(e.to_string()),
            AuthError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!(token)))
}

/// Stateless check that a bearer token is ours and unexpired.
#[axum::debug_handler]
pub async fn validate(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<TokenStatus>, AppError> {
    debug!("Validating token");

    match validate_token(auth.token(), &state.jwt_secret) {
        Ok(user) => Ok(Json(TokenStatus {
            valid: true,
            user_id: user.id,
            email: user.email,
            role: user.role,
        })),
        Err(err) => Err(AppError::Auth(err)),
    }
}
