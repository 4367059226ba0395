use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::user::UserType;

use crate::jwt;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserType,
}

impl TestUser {
    pub fn new(email: &str, role: UserType) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, UserType::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, UserType::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, UserType::Admin)
    }

    /// Bearer token the way the login endpoint would mint it.
    pub fn token(&self, jwt_secret: &str) -> String {
        jwt::issue_token(self.id, &self.email, self.role, jwt_secret)
            .expect("test token issuance failed")
    }
}

/// Canned PostgREST row payloads for wiremock.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_row(
        id: Uuid,
        full_name: &str,
        email: &str,
        user_type: UserType,
        available_timeslots: Option<&str>,
    ) -> Value {
        json!({
            "id": id,
            "full_name": full_name,
            "email": email,
            "mobile": "01700000000",
            "user_type": user_type,
            "available_timeslots": available_timeslots,
            "profile_image": null,
            "is_active": true,
            "hashed_password": "",
            "created_at": Utc::now().to_rfc3339(),
        })
    }

    pub fn doctor_row(id: Uuid, available_timeslots: &str) -> Value {
        Self::user_row(id, "Dr. Test", "doctor@example.com", UserType::Doctor, Some(available_timeslots))
    }

    pub fn appointment_row(
        doctor_id: Uuid,
        patient_id: Uuid,
        appointment_date: NaiveDateTime,
        status: &str,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "appointment_date": appointment_date,
            "notes": null,
            "status": status,
            "created_at": Utc::now().to_rfc3339(),
        })
    }
}
