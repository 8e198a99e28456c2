use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use db::models::attendance_entry::{self, AttendanceStatus};
use serde::{Deserialize, Serialize};
use util::state::AppState;

/// Default lookback for history queries with no explicit range.
const DEFAULT_HISTORY_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub course_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub course_id: i64,
    pub status: AttendanceStatus,
    pub marked_at: NaiveDateTime,
}

/// GET /student/attendance?course_id=&from=&to=
///
/// The student's own attendance history, optionally narrowed to one course.
/// Defaults to the last 30 days when no range is given.
pub async fn get_history(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let to = query.to.unwrap_or_else(|| app_state.today());
    let from = query
        .from
        .unwrap_or(to - Duration::days(DEFAULT_HISTORY_DAYS));

    let rows = attendance_entry::Model::history_for_student(
        app_state.db(),
        claims.sub,
        query.course_id,
        from,
        to,
    )
    .await
    .map_err(db_error)?;

    let mut history: Vec<HistoryRow> = rows
        .into_iter()
        .filter_map(|(entry, group)| {
            group.map(|g| HistoryRow {
                date: g.session_date,
                course_id: g.course_id,
                status: entry.status,
                marked_at: entry.marked_at,
            })
        })
        .collect();
    history.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(Json(ApiResponse::success(
        history,
        "Attendance history retrieved successfully",
    )))
}
