use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use db::error::DomainError;
use db::models::attendance_group;
use serde::Deserialize;
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

/// PUT /admin/attendance/{course_id}/{date}/lock
///
/// Sets or clears the lock flag on an existing attendance group. This is the
/// only way a locked group opens for editing; approving an unlock request
/// does not do it implicitly.
pub async fn set_group_lock(
    State(app_state): State<AppState>,
    Path((course_id, date)): Path<(i64, NaiveDate)>,
    Json(req): Json<LockRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match attendance_group::Model::set_locked(app_state.db(), course_id, date, req.locked).await {
        Ok(group) => {
            let message = if req.locked {
                "Attendance group locked"
            } else {
                "Attendance group unlocked"
            };
            Ok(Json(ApiResponse::success(group, message)))
        }
        Err(DomainError::GroupNotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No attendance recorded for this date")),
        )),
        Err(e) => Err(db_error(e)),
    }
}
