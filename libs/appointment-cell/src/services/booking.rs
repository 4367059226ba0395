use chrono::{Local, NaiveDateTime, Utc};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DbError, SupabaseClient};
use shared_models::user::UserType;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, CreateAppointmentRequest,
    DoctorAvailabilityResponse,
};
use crate::services::availability::AvailabilityService;
use crate::services::conflict::{format_timestamp, ConflictService};

/// Length of the uniqueness bucket backing the database-level guard against
/// double booking (see `slot_bucket`).
const SLOT_BUCKET_MINUTES: i64 = 30;

/// Orchestrates booking, status transitions and per-user listings.
pub struct BookingService {
    db: Arc<SupabaseClient>,
    availability: AvailabilityService,
    conflicts: ConflictService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let db = Arc::new(SupabaseClient::new(config));
        Self {
            availability: AvailabilityService::new(db.clone()),
            conflicts: ConflictService::new(db.clone()),
            db,
        }
    }

    /// Book an appointment. Check order is load-bearing for deterministic
    /// error reporting: request validation, permission, self-booking, doctor
    /// existence, availability, overlap, insert.
    pub async fn book_appointment(
        &self,
        requester_id: Uuid,
        requester_role: UserType,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        if request.appointment_date < Local::now().naive_local() {
            return Err(AppointmentError::InvalidTime(
                "Appointment date cannot be in the past".to_string(),
            ));
        }

        if requester_id != request.patient_id && requester_role != UserType::Admin {
            return Err(AppointmentError::NotPermitted(
                "Can only book appointments for yourself".to_string(),
            ));
        }

        if request.patient_id == request.doctor_id {
            return Err(AppointmentError::SelfBooking);
        }

        if self.availability.get_doctor(request.doctor_id).await?.is_none() {
            return Err(AppointmentError::DoctorNotFound);
        }

        if !self
            .availability
            .is_doctor_available(request.doctor_id, request.appointment_date)
            .await?
        {
            return Err(AppointmentError::DoctorNotAvailable);
        }

        if self
            .conflicts
            .has_overlapping_appointment(request.doctor_id, request.appointment_date)
            .await?
        {
            return Err(AppointmentError::SlotTaken);
        }

        let appointment = self.insert_appointment(&request).await?;

        info!(
            "Appointment {} booked for patient {} with doctor {}",
            appointment.id, appointment.patient_id, appointment.doctor_id
        );
        Ok(appointment)
    }

    /// Role-gated status change. Patients may only cancel their own
    /// appointments, doctors may only touch their own schedule, admins are
    /// unrestricted. The target status itself is not validated against the
    /// current one.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        requester_id: Uuid,
        requester_role: UserType,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment {} to {}", appointment_id, new_status);

        let appointment = self
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        match requester_role {
            UserType::Patient => {
                if appointment.patient_id != requester_id {
                    return Err(AppointmentError::NotPermitted(
                        "Not authorized to update this appointment".to_string(),
                    ));
                }
                if new_status != AppointmentStatus::Cancelled {
                    return Err(AppointmentError::NotPermitted(
                        "Patients can only cancel appointments".to_string(),
                    ));
                }
            }
            UserType::Doctor => {
                if appointment.doctor_id != requester_id {
                    return Err(AppointmentError::NotPermitted(
                        "Not authorized to update this appointment".to_string(),
                    ));
                }
            }
            UserType::Admin => {}
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows = self
            .db
            .write_returning(Method::PATCH, &path, json!({ "status": new_status }))
            .await
            .map_err(map_db_error)?;

        let updated = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Update returned no rows".to_string()))?;

        serde_json::from_value(updated)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// Listings are role-shaped: doctors see their own schedule, patients and
    /// admins the appointments booked for them.
    pub async fn appointments_for_user(
        &self,
        user_id: Uuid,
        role: UserType,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = match role {
            UserType::Doctor => format!("doctor_id=eq.{}", user_id),
            UserType::Patient | UserType::Admin => format!("patient_id=eq.{}", user_id),
        };

        let path = format!("/rest/v1/appointments?{}&order=appointment_date.asc", filter);

        self.db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    /// Availability summary for one doctor and candidate time, as exposed on
    /// the public availability endpoint.
    pub async fn check_doctor_availability(
        &self,
        doctor_id: Uuid,
        at: NaiveDateTime,
    ) -> Result<DoctorAvailabilityResponse, AppointmentError> {
        let doctor = self
            .availability
            .get_doctor(doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        let is_available = self.availability.is_doctor_available(doctor_id, at).await?;
        let is_booked = self.conflicts.has_overlapping_appointment(doctor_id, at).await?;

        Ok(DoctorAvailabilityResponse {
            is_available,
            is_booked,
            available_timeslots: doctor.available_timeslots,
        })
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);

        let rows: Vec<Appointment> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    async fn insert_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let payload = json!({
            "doctor_id": request.doctor_id,
            "patient_id": request.patient_id,
            "appointment_date": format_timestamp(request.appointment_date),
            "notes": request.notes,
            "status": AppointmentStatus::Pending,
            "slot_bucket": slot_bucket(request.appointment_date),
            "created_at": Utc::now().to_rfc3339(),
        });

        let rows = self
            .db
            .write_returning(Method::POST, "/rest/v1/appointments", payload)
            .await
            .map_err(map_db_error)?;

        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Insert returned no rows".to_string()))?;

        serde_json::from_value(created)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }
}

/// Bucket index for the partial unique constraint on
/// `(doctor_id, slot_bucket) WHERE status <> 'cancelled'`. Closes the
/// check-then-insert race: of two concurrent bookings for the same half-hour
/// only one insert can win; the loser gets a 409 from PostgREST.
pub(crate) fn slot_bucket(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp() / (SLOT_BUCKET_MINUTES * 60)
}

/// A constraint violation on write means the slot was claimed between the
/// advisory overlap check and the insert.
fn map_db_error(e: DbError) -> AppointmentError {
    match e {
        DbError::Conflict(_) => AppointmentError::SlotTaken,
        other => AppointmentError::DatabaseError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn same_half_hour_shares_a_bucket() {
        assert_eq!(slot_bucket(at(10, 0)), slot_bucket(at(10, 20)));
    }

    #[test]
    fn buckets_advance_every_thirty_minutes() {
        assert_eq!(slot_bucket(at(10, 0)) + 1, slot_bucket(at(10, 30)));
        assert_ne!(slot_bucket(at(10, 0)), slot_bucket(at(11, 0)));
    }

    #[test]
    fn conflict_on_write_maps_to_slot_taken() {
        let err = map_db_error(DbError::Conflict("duplicate key".to_string()));
        assert!(matches!(err, AppointmentError::SlotTaken));
    }
}
