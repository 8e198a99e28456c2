//! Shared lookups for the teacher handlers.

use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use axum::{Json, http::StatusCode};
use chrono::{NaiveDate, NaiveDateTime};
use db::attendance_policy::{self, SessionStatus};
use db::models::{attendance_group, course, unlock_request};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;

/// Loads a course and checks the acting teacher owns it.
///
/// Scope is always taken from the authenticated claims, never from the
/// request body.
pub async fn owned_course(
    db: &DatabaseConnection,
    course_id: i64,
    teacher_id: i64,
) -> Result<course::Model, ErrorResponse> {
    let course = course::Model::find_by_id(db, course_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Course not found")),
            )
        })?;

    if !course.owned_by(teacher_id) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("You do not teach this course")),
        ));
    }
    Ok(course)
}

/// Everything the window policy has to say about one (course, date) at one
/// instant, fetched once and reused by the handlers.
#[derive(Debug, Serialize)]
pub struct SessionRules {
    pub can_mark: bool,
    pub can_edit: bool,
    pub status: SessionStatus,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            can_mark: false,
            can_edit: false,
            status: SessionStatus::NotAllowed,
        }
    }
}

pub async fn session_rules(
    db: &DatabaseConnection,
    course: &course::Model,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<SessionRules, DbErr> {
    let lock = attendance_group::Model::lock_state(db, course.id, date).await?;
    let signals = unlock_request::Model::signals_for(db, course.id, date).await?;
    Ok(SessionRules {
        can_mark: attendance_policy::can_mark(course.start_time, date, now),
        can_edit: attendance_policy::can_edit(course.start_time, date, now, lock, signals),
        status: attendance_policy::classify(course.start_time, date, now, lock, signals),
    })
}
