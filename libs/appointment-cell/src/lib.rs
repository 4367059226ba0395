pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    CreateAppointmentRequest, DoctorAvailabilityResponse, UpdateStatusRequest,
};

pub use router::appointment_routes;
