use chrono::{Duration, NaiveDateTime};
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// No two active appointments for one doctor may sit within this many
/// minutes of each other.
pub const OVERLAP_WINDOW_MINUTES: i64 = 30;

pub struct ConflictService {
    db: Arc<SupabaseClient>,
}

impl ConflictService {
    pub fn new(db: Arc<SupabaseClient>) -> Self {
        Self { db }
    }

    /// True when at least one non-cancelled appointment for the doctor falls
    /// in the closed interval around the candidate time. Existence only;
    /// callers never need the conflicting rows themselves.
    pub async fn has_overlapping_appointment(
        &self,
        doctor_id: Uuid,
        at: NaiveDateTime,
    ) -> Result<bool, AppointmentError> {
        debug!("Checking overlaps for doctor {} around {}", doctor_id, at);

        let (window_start, window_end) = overlap_window(at);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=gte.{}&appointment_date=lte.{}&order=appointment_date.asc",
            doctor_id,
            format_timestamp(window_start),
            format_timestamp(window_end),
        );

        let rows: Vec<Appointment> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let has_overlap = rows
            .iter()
            .any(|appointment| is_active(&appointment.status) && in_window(at, appointment.appointment_date));

        if has_overlap {
            warn!("Overlap detected for doctor {} at {}", doctor_id, at);
        }

        Ok(has_overlap)
    }
}

/// Closed interval `[at - 30m, at + 30m]`.
pub(crate) fn overlap_window(at: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    (
        at - Duration::minutes(OVERLAP_WINDOW_MINUTES),
        at + Duration::minutes(OVERLAP_WINDOW_MINUTES),
    )
}

pub(crate) fn in_window(candidate: NaiveDateTime, existing: NaiveDateTime) -> bool {
    (existing - candidate).num_minutes().abs() <= OVERLAP_WINDOW_MINUTES
}

/// Cancelled appointments release their slot; every other status holds it.
pub(crate) fn is_active(status: &AppointmentStatus) -> bool {
    !matches!(status, AppointmentStatus::Cancelled)
}

pub(crate) fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}
