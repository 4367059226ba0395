use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::user::UserType;

use crate::models::{
    AppointmentError, AvailabilityQuery, BookAppointmentRequest, CreateAppointmentRequest,
    UpdateStatusRequest,
};
use crate::services::booking::BookingService;

/// `POST /book`. Patients book for themselves; the patient id always comes
/// from the verified identity, never the body.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    if user.role != UserType::Patient {
        return Err(AppError::Forbidden(
            "Only patients can book appointments".to_string(),
        ));
    }

    let booking_service = BookingService::new(&state);

    let create_request = CreateAppointmentRequest {
        doctor_id: request.doctor_id,
        patient_id: user.id,
        appointment_date: request.appointment_date,
        notes: request.notes,
    };

    let appointment = booking_service
        .book_appointment(user.id, user.role, create_request)
        .await
        .map_err(|e| match e {
            AppointmentError::NotPermitted(msg) => AppError::Forbidden(msg),
            AppointmentError::DoctorNotFound => AppError::NotFound(e.to_string()),
            AppointmentError::SelfBooking
            | AppointmentError::DoctorNotAvailable
            | AppointmentError::SlotTaken => AppError::BadRequest(e.to_string()),
            AppointmentError::InvalidTime(msg) => AppError::BadRequest(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

/// `GET /my-appointments`. Doctors get their schedule, everyone else the
/// appointments booked for them.
#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .appointments_for_user(user.id, user.role)
        .await
        .map_err(|e| match e {
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!(appointments)))
}

/// `PATCH /{appointment_id}/status`
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .update_status(appointment_id, request.status, user.id, user.role)
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => AppError::NotFound(e.to_string()),
            AppointmentError::NotPermitted(msg) => AppError::Forbidden(msg),
            AppointmentError::SlotTaken => AppError::Conflict(e.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

/// `GET /doctors/{doctor_id}/availability?date=`. Public probe combining
/// the working-hours flag, the overlap flag and the raw declared window.
#[axum::debug_handler]
pub async fn check_doctor_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let availability = booking_service
        .check_doctor_availability(doctor_id, query.date)
        .await
        .map_err(|e| match e {
            AppointmentError::DoctorNotFound => AppError::NotFound(e.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!(availability)))
}
