use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use crate::routes::teacher::common::{owned_course, session_rules};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use common::format_validation_errors;
use db::error::DomainError;
use db::models::attendance_group::{self, EntryChange};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateEntry {
    pub student_id: i64,
    pub status: db::models::attendance_entry::AttendanceStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRequest {
    pub course_id: i64,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "At least one attendance entry is required"))]
    pub entries: Vec<UpdateEntry>,
}

#[derive(Debug, Serialize, Default)]
pub struct UpdateResponse {
    pub updated: usize,
}

/// PUT /teacher/attendance/update
///
/// Edits statuses inside an existing attendance group. Permitted in the live
/// mark window, or later when the group has been unlocked, always inside the
/// 2-day horizon.
///
/// ### Responses
/// - `200 OK` with the number of entries that actually changed
/// - `403 Forbidden` when the group is locked or the horizon has passed
/// - `404 Not Found` when no group exists for that date
pub async fn update_attendance(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<UpdateRequest>,
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
    if !rules.can_edit {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "Attendance is locked; request an unlock to edit it",
            )),
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

    match attendance_group::Model::update_statuses(db, course.id, req.date, &changes, now).await {
        Ok(updated) => Ok(Json(ApiResponse::success(
            UpdateResponse { updated },
            "Attendance updated successfully",
        ))),
        Err(DomainError::GroupNotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No attendance recorded for this date")),
        )),
        Err(e) => Err(db_error(e)),
    }
}
