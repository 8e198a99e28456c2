use crate::auth::AuthUser;
use crate::auth::qr::issue_marker_token;
use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use crate::routes::teacher::common::{owned_course, session_rules};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use common::format_validation_errors;
use db::error::DomainError;
use db::models::attendance_entry::AttendanceStatus;
use db::models::attendance_group::{self, EntryChange};
use db::models::unlock_request;
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct RulesCheckRequest {
    pub course_id: i64,
    pub date: NaiveDate,
}

/// POST /teacher/attendance/rules/check
///
/// Evaluates the window policy for one (course, date) without changing
/// anything. The marking UI calls this before rendering its controls.
pub async fn check_rules(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<RulesCheckRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let db = app_state.db();
    let course = owned_course(db, req.course_id, claims.sub).await?;
    let rules = session_rules(db, &course, req.date, app_state.now())
        .await
        .map_err(db_error)?;
    Ok(Json(ApiResponse::success(
        rules,
        "Attendance rules evaluated",
    )))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MarkEntry {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MarkRequest {
    pub course_id: i64,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "At least one attendance entry is required"))]
    pub entries: Vec<MarkEntry>,
}

#[derive(Debug, Serialize, Default)]
pub struct MarkResponse {
    pub group_id: i64,
    pub locked: bool,
    pub entries: usize,
}

/// POST /teacher/attendance/mark
///
/// Creates the attendance group for (course, date) with the submitted
/// statuses. Allowed inside the live mark window, or afterwards when an
/// approved unlock request pre-authorizes a late first marking.
///
/// ### Responses
/// - `201 Created` with the new group
/// - `403 Forbidden` when the window is closed
/// - `409 Conflict` when attendance was already marked for that date
pub async fn mark_attendance(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<MarkRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if let Err(validation_errors) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let db = app_state.db();
    let now = app_state.now();
    let course = owned_course(db, req.course_id, claims.sub).await?;

    let rules = session_rules(db, &course, req.date, now)
        .await
        .map_err(db_error)?;
    if !rules.can_mark && !rules.can_edit {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Attendance window is closed")),
        ));
    }

    let changes: Vec<EntryChange> = req
        .entries
        .iter()
        .map(|e| EntryChange {
            student_id: e.student_id,
            status: e.status,
        })
        .collect();

    match attendance_group::Model::create_group(db, course.id, req.date, claims.sub, &changes, now)
        .await
    {
        Ok(group) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(
                MarkResponse {
                    group_id: group.id,
                    locked: group.locked,
                    entries: changes.len(),
                },
                "Attendance marked successfully",
            )),
        )),
        Err(DomainError::AlreadyMarked) => Err((
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "Attendance already marked for this date",
            )),
        )),
        Err(e) => Err(db_error(e)),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UnlockRequestBody {
    pub course_id: i64,
    pub date: NaiveDate,
    #[validate(length(min = 3, message = "Reason must be at least 3 characters"))]
    pub reason: String,
    pub request_type: Option<String>,
}

/// POST /teacher/unlock-requests
///
/// Files a request to re-open a (course, date). Duplicates are allowed; the
/// admin queue shows them all.
pub async fn create_unlock_request(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<UnlockRequestBody>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if let Err(validation_errors) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let db = app_state.db();
    let course = owned_course(db, req.course_id, claims.sub).await?;

    let request = unlock_request::Model::create(
        db,
        claims.sub,
        course.id,
        req.date,
        &req.reason,
        req.request_type.as_deref().unwrap_or("GENERAL"),
        app_state.now(),
    )
    .await
    .map_err(db_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            request,
            "Unlock request submitted successfully",
        )),
    ))
}

#[derive(Debug, Serialize, Default)]
pub struct QrTokenResponse {
    pub token: String,
    pub expires_at: String,
}

/// POST /teacher/courses/{course_id}/qr
///
/// Issues a fresh short-lived marker token for the course. The projector
/// page polls this and re-renders the QR code before each expiry.
pub async fn issue_qr(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let course = owned_course(app_state.db(), course_id, claims.sub).await?;

    let (token, expires_at) = issue_marker_token(course.id);
    Ok(Json(ApiResponse::success(
        QrTokenResponse { token, expires_at },
        "QR token issued",
    )))
}
