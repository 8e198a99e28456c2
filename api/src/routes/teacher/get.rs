use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use crate::routes::teacher::common::{owned_course, session_rules};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use db::attendance_policy::SessionStatus;
use db::models::attendance_entry::AttendanceStatus;
use db::models::{attendance_group, course, student_profile, unlock_request};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use util::state::AppState;

#[derive(Debug, Serialize)]
pub struct TodayClass {
    pub id: i64,
    pub course_code: String,
    pub course_name: String,
    pub class_room: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize, Default)]
pub struct DashboardResponse {
    pub total_courses: usize,
    pub total_students: usize,
    pub pending_requests: usize,
    /// How many of today's classes already have attendance recorded.
    pub marked_today: usize,
    pub today: Vec<TodayClass>,
}

/// GET /teacher/dashboard
///
/// Headline counts plus today's timetable slice, each class tagged with its
/// session status so the UI can render the right action (mark / wait /
/// request unlock).
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ErrorResponse> {
    let db = app_state.db();
    let now = app_state.now();

    let courses = course::Model::for_teacher(db, claims.sub)
        .await
        .map_err(db_error)?;

    // Students counted once per cohort, even when a teacher has several
    // courses with the same class group.
    let mut class_ids: Vec<i64> = courses.iter().map(|c| c.class_group_id).collect();
    class_ids.sort_unstable();
    class_ids.dedup();
    let mut total_students = 0;
    for class_group_id in class_ids {
        total_students += student_profile::Model::roster(db, class_group_id)
            .await
            .map_err(db_error)?
            .len();
    }

    let pending_requests = unlock_request::Model::for_teacher(db, claims.sub)
        .await
        .map_err(db_error)?
        .iter()
        .filter(|r| r.status == unlock_request::RequestStatus::Pending)
        .count();

    let weekday = now.date().weekday().num_days_from_monday() as i16;
    let mut today = Vec::new();
    let mut marked_today = 0;
    for c in course::Model::today_for_teacher(db, claims.sub, weekday)
        .await
        .map_err(db_error)?
    {
        if attendance_group::Model::find_by_course_and_date(db, c.id, now.date())
            .await
            .map_err(db_error)?
            .is_some()
        {
            marked_today += 1;
        }
        let rules = session_rules(db, &c, now.date(), now)
            .await
            .map_err(db_error)?;
        today.push(TodayClass {
            id: c.id,
            course_code: c.course_code,
            course_name: c.course_name,
            class_room: c.class_room,
            start_time: c.start_time,
            end_time: c.end_time,
            status: rules.status,
        });
    }

    let response = DashboardResponse {
        total_courses: courses.len(),
        total_students,
        pending_requests,
        marked_today,
        today,
    };
    Ok(Json(ApiResponse::success(
        response,
        "Dashboard retrieved successfully",
    )))
}

/// GET /teacher/courses
///
/// All courses taught by the authenticated teacher, ordered by course code.
pub async fn get_courses(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ErrorResponse> {
    let courses = course::Model::for_teacher(app_state.db(), claims.sub)
        .await
        .map_err(db_error)?;
    Ok(Json(ApiResponse::success(
        courses,
        "Courses retrieved successfully",
    )))
}

#[derive(Debug, Serialize)]
pub struct StudentRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roll_number: String,
}

/// GET /teacher/courses/{course_id}/students
///
/// The roster of the course's class group.
pub async fn get_students(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let db = app_state.db();
    let course = owned_course(db, course_id, claims.sub).await?;

    let roster = student_profile::Model::roster(db, course.class_group_id)
        .await
        .map_err(db_error)?;
    let students: Vec<StudentRow> = roster
        .into_iter()
        .filter_map(|(profile, user)| {
            user.map(|u| StudentRow {
                id: profile.user_id,
                name: u.name,
                email: u.email,
                roll_number: profile.roll_number,
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(
        students,
        "Students retrieved successfully",
    )))
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct AttendanceRecordRow {
    pub student_id: i64,
    pub name: String,
    pub roll_number: String,
    /// `None` until an attendance group exists for this date.
    pub status: Option<AttendanceStatus>,
    pub marked_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Default)]
pub struct AttendanceDayResponse {
    pub date: NaiveDate,
    pub marked: bool,
    /// Lock flag of the group; `None` while no group exists.
    pub locked: Option<bool>,
    pub can_mark: bool,
    pub can_edit: bool,
    pub status: Option<SessionStatus>,
    pub records: Vec<AttendanceRecordRow>,
}

/// GET /teacher/courses/{course_id}/attendance?date=YYYY-MM-DD
///
/// The full roster merged with whatever was recorded for that date. Students
/// without an entry come back with a null status, so the marking screen can
/// render the whole class either way.
pub async fn get_attendance(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(course_id): Path<i64>,
    Query(query): Query<AttendanceQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let db = app_state.db();
    let now = app_state.now();
    let course = owned_course(db, course_id, claims.sub).await?;

    let group = attendance_group::Model::find_by_course_and_date(db, course.id, query.date)
        .await
        .map_err(db_error)?;
    let entries = attendance_group::Model::entries(db, course.id, query.date)
        .await
        .map_err(db_error)?;
    let by_student: HashMap<i64, &db::models::attendance_entry::Model> =
        entries.iter().map(|e| (e.student_id, e)).collect();

    let roster = student_profile::Model::roster(db, course.class_group_id)
        .await
        .map_err(db_error)?;
    let records: Vec<AttendanceRecordRow> = roster
        .into_iter()
        .filter_map(|(profile, user)| {
            let entry = by_student.get(&profile.user_id);
            user.map(|u| AttendanceRecordRow {
                student_id: profile.user_id,
                name: u.name,
                roll_number: profile.roll_number,
                status: entry.map(|e| e.status),
                marked_at: entry.map(|e| e.marked_at),
            })
        })
        .collect();

    let rules = session_rules(db, &course, query.date, now)
        .await
        .map_err(db_error)?;

    let response = AttendanceDayResponse {
        date: query.date,
        marked: group.is_some(),
        locked: group.map(|g| g.locked),
        can_mark: rules.can_mark,
        can_edit: rules.can_edit,
        status: Some(rules.status),
        records,
    };
    Ok(Json(ApiResponse::success(
        response,
        "Attendance retrieved successfully",
    )))
}

#[derive(Debug, Serialize, Default)]
pub struct PerformanceResponse {
    pub course_id: i64,
    pub student_id: i64,
    pub total_sessions: u64,
    pub present: u64,
    pub percentage: f64,
}

/// GET /teacher/courses/{course_id}/students/{student_id}/performance
///
/// Attendance percentage of one student in one course, over every session
/// recorded so far.
pub async fn get_performance(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((course_id, student_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let db = app_state.db();
    let course = owned_course(db, course_id, claims.sub).await?;

    let (total_sessions, present) =
        db::models::attendance_entry::Model::performance_counts(db, course.id, student_id)
            .await
            .map_err(db_error)?;
    let percentage = if total_sessions == 0 {
        0.0
    } else {
        present as f64 * 100.0 / total_sessions as f64
    };

    let response = PerformanceResponse {
        course_id: course.id,
        student_id,
        total_sessions,
        present,
        percentage,
    };
    Ok(Json(ApiResponse::success(
        response,
        "Performance retrieved successfully",
    )))
}

/// GET /teacher/unlock-requests
///
/// The teacher's own requests, newest first.
pub async fn get_unlock_requests(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ErrorResponse> {
    let requests = unlock_request::Model::for_teacher(app_state.db(), claims.sub)
        .await
        .map_err(db_error)?;
    Ok(Json(ApiResponse::success(
        requests,
        "Unlock requests retrieved successfully",
    )))
}
