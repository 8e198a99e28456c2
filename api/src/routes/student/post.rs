use crate::auth::AuthUser;
use crate::auth::qr::verify_marker_token;
use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use db::attendance_policy;
use db::models::{attendance_group, course, student_profile};
use serde::Deserialize;
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub token: String,
}

/// POST /student/attendance/qr
///
/// Redeems a scanned marker token, marking the student present for the
/// course the token is bound to. Only works inside the course's live mark
/// window and only for students enrolled in its class group.
///
/// When no attendance group exists yet for today, the scan creates one from
/// the roster: the scanner Present, everyone else Absent, ready for the
/// teacher to adjust.
///
/// ### Responses
/// - `200 OK` once the student is recorded Present (idempotent)
/// - `401 Unauthorized` on an invalid or expired token
/// - `403 Forbidden` outside the mark window or for another cohort's course
pub async fn redeem_qr(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<RedeemRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let Some(course_id) = verify_marker_token(&req.token) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid or expired QR token")),
        ));
    };

    let db = app_state.db();
    let now = app_state.now();

    let course = course::Model::find_by_id(db, course_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Course not found")),
            )
        })?;

    let profile = student_profile::Model::for_user(db, claims.sub)
        .await
        .map_err(db_error)?;
    let enrolled = profile
        .map(|p| p.class_group_id == course.class_group_id)
        .unwrap_or(false);
    if !enrolled {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("You are not enrolled in this course")),
        ));
    }

    if !attendance_policy::can_mark(course.start_time, now.date(), now) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Attendance window is closed")),
        ));
    }

    attendance_group::Model::mark_single(db, &course, now.date(), claims.sub, now)
        .await
        .map_err(db_error)?;

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "course_id": course.id, "date": now.date() }),
        "Attendance marked successfully",
    )))
}
