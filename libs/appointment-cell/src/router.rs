use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // Availability lookup is public so patients can probe slots before
    // logging in; everything that touches records requires identity.
    let public_routes = Router::new().route(
        "/doctors/{doctor_id}/availability",
        get(handlers::check_doctor_availability),
    );

    let protected_routes = Router::new()
        .route("/book", post(handlers::book_appointment))
        .route("/my-appointments", get(handlers::get_my_appointments))
        .route(
            "/{appointment_id}/status",
            patch(handlers::update_appointment_status),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
