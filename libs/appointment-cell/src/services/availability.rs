use chrono::{NaiveDateTime, Timelike};
use reqwest::Method;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;
use shared_models::user::{User, UserType};

use crate::models::AppointmentError;

/// Decides whether a candidate time falls inside a doctor's declared
/// working-hours window.
pub struct AvailabilityService {
    db: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(db: Arc<SupabaseClient>) -> Self {
        Self { db }
    }

    /// Fails closed: an unknown doctor or one without a declared window is
    /// unavailable for every slot. A window that cannot be parsed is a
    /// configuration error and surfaces as such.
    pub async fn is_doctor_available(
        &self,
        doctor_id: Uuid,
        at: NaiveDateTime,
    ) -> Result<bool, AppointmentError> {
        debug!("Checking availability of doctor {} at {}", doctor_id, at);

        let doctor = match self.get_doctor(doctor_id).await? {
            Some(doctor) => doctor,
            None => return Ok(false),
        };

        let window = match doctor.available_timeslots.as_deref() {
            Some(window) if !window.is_empty() => window.to_owned(),
            _ => return Ok(false),
        };

        let (start_hour, end_hour) = parse_hour_window(&window)?;

        Ok(start_hour <= at.hour() && at.hour() < end_hour)
    }

    /// Doctor row lookup; `None` when the id is unknown or not a doctor.
    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<User>, AppointmentError> {
        let path = format!("/rest/v1/users?id=eq.{}", doctor_id);

        let rows: Vec<User> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .next()
            .filter(|user| user.user_type == UserType::Doctor))
    }
}

/// Parse `"HH:MM-HH:MM"` into start and end hours. Minutes are declared but
/// ignored; the window is hour-granular.
pub(crate) fn parse_hour_window(window: &str) -> Result<(u32, u32), AppointmentError> {
    let (start, end) = window
        .split_once('-')
        .ok_or_else(|| AppointmentError::InvalidAvailabilityWindow(window.to_string()))?;

    let hour_of = |part: &str| {
        part.split(':')
            .next()
            .unwrap_or(part)
            .trim()
            .parse::<u32>()
            .map_err(|_| AppointmentError::InvalidAvailabilityWindow(window.to_string()))
    };

    Ok((hour_of(start)?, hour_of(end)?))
}
