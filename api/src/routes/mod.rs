//! HTTP route entry point for `/api/...`.
//!
//! Routes are organized by audience, each group protected by the matching
//! role guard:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Login (public)
//! - `/teacher` → Timetable, attendance marking and unlock requests (teachers)
//! - `/student` → QR self-marking and personal history (students)
//! - `/admin` → Unlock request review and group lock management (admins)

use crate::auth::guards::{allow_admin, allow_student, allow_teacher};
use crate::routes::{
    admin::admin_routes, auth::auth_routes, health::health_routes, student::student_routes,
    teacher::teacher_routes,
};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod admin;
pub mod auth;
pub mod common;
pub mod health;
pub mod student;
pub mod teacher;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router carries `AppState` (database connection plus the
/// campus clock) and mounts all route groups under their base paths.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest(
            "/teacher",
            teacher_routes().route_layer(from_fn(allow_teacher)),
        )
        .nest(
            "/student",
            student_routes().route_layer(from_fn(allow_student)),
        )
        .nest("/admin", admin_routes().route_layer(from_fn(allow_admin)))
        .with_state(app_state)
}
