use axum::{
    Router,
    routing::{get, post, put},
};
use util::state::AppState;

pub mod common;
pub mod get;
pub mod post;
pub mod put;

use get::{get_attendance, get_courses, get_dashboard, get_performance, get_students, get_unlock_requests};
use post::{check_rules, create_unlock_request, issue_qr, mark_attendance};
use put::update_attendance;

/// Builds the `/teacher` route group. Everything here sits behind the
/// teacher role guard; per-course ownership is checked inside the handlers.
pub fn teacher_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/courses", get(get_courses))
        .route("/courses/{course_id}/students", get(get_students))
        .route("/courses/{course_id}/attendance", get(get_attendance))
        .route(
            "/courses/{course_id}/students/{student_id}/performance",
            get(get_performance),
        )
        .route("/courses/{course_id}/qr", post(issue_qr))
        .route("/attendance/rules/check", post(check_rules))
        .route("/attendance/mark", post(mark_attendance))
        .route("/attendance/update", put(update_attendance))
        .route(
            "/unlock-requests",
            get(get_unlock_requests).post(create_unlock_request),
        )
}
