use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, accept_reservation, add_member, availability, cancel_reservation, change_role,
    create_atelier, create_equipment_type, create_reservation, delete_atelier, delete_equipment,
    delete_equipment_type, delete_person, equipment_calendar, equipment_history, get_dashboard,
    landing, login, logout, register, register_equipment, remove_member, rename_atelier,
    rename_equipment_type, return_loan, update_equipment, update_profile,
};

/// Creates the API router
///
/// Accounts:
/// - POST /auth/register, POST /auth/login, POST /auth/logout, GET /auth/landing
/// - PUT /account
///
/// Bookings:
/// - GET /equipment/:id/availability, GET /equipment/:id/calendar, GET /equipment/:id/history
/// - POST /reservations, POST /reservations/:id/accept, DELETE /reservations/:id
/// - POST /loans/:id/return
///
/// Inventory and administration:
/// - POST /ateliers, PUT /ateliers/:id, DELETE /ateliers/:id, POST /ateliers/:id/members,
///   DELETE /ateliers/:id/members/:person_id
/// - POST /equipment-types, PUT /equipment-types/:id, DELETE /equipment-types/:id
/// - POST /equipment, PUT /equipment/:id, DELETE /equipment/:id
/// - PUT /persons/:id/role, DELETE /persons/:id
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Accounts
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/landing", get(landing))
        .route("/account", put(update_profile))
        .route("/dashboard", get(get_dashboard))
        .route("/persons/:id", delete(delete_person))
        .route("/persons/:id/role", put(change_role))
        // Bookings
        .route("/equipment/:id/availability", get(availability))
        .route("/equipment/:id/calendar", get(equipment_calendar))
        .route("/equipment/:id/history", get(equipment_history))
        .route("/reservations", post(create_reservation))
        .route("/reservations/:id", delete(cancel_reservation))
        .route("/reservations/:id/accept", post(accept_reservation))
        .route("/loans/:id/return", post(return_loan))
        // Inventory
        .route("/ateliers", post(create_atelier))
        .route("/ateliers/:id", put(rename_atelier).delete(delete_atelier))
        .route("/ateliers/:id/members", post(add_member))
        .route("/ateliers/:id/members/:person_id", delete(remove_member))
        .route("/equipment-types", post(create_equipment_type))
        .route(
            "/equipment-types/:id",
            put(rename_equipment_type).delete(delete_equipment_type),
        )
        .route("/equipment", post(register_equipment))
        .route("/equipment/:id", put(update_equipment).delete(delete_equipment))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
