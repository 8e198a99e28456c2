mod helpers;

use axum::http::StatusCode;
use chrono::{NaiveDate, NaiveDateTime};
use helpers::app::{body_json, get, make_test_app, send_json};
use helpers::data::{bearer, seed_basic};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    day().and_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
#[serial]
async fn scan_marks_scanner_present_and_seeds_the_rest_absent() {
    let (app, db) = make_test_app(at(9, 2)).await;
    let fixture = seed_basic(&db).await;

    // Teacher projects a QR token.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/teacher/courses/{}/qr", fixture.course.id),
            Some(&bearer(&fixture.teacher)),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let token = json["data"]["token"].as_str().unwrap().to_owned();
    assert!(json["data"]["expires_at"].as_str().is_some());

    // A student scans it.
    let scanner = &fixture.students[1];
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/student/attendance/qr",
            Some(&bearer(scanner)),
            json!({ "token": &token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let entries = db::models::attendance_group::Model::entries(&db, fixture.course.id, day())
        .await
        .unwrap();
    assert_eq!(entries.len(), fixture.students.len());
    for entry in &entries {
        let expected = if entry.student_id == scanner.id {
            db::models::attendance_entry::AttendanceStatus::Present
        } else {
            db::models::attendance_entry::AttendanceStatus::Absent
        };
        assert_eq!(entry.status, expected);
    }

    // The scan shows up in the student's own history.
    let response = app
        .clone()
        .oneshot(get("/api/student/attendance", Some(&bearer(scanner))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], "present");
    assert_eq!(history[0]["course_id"], fixture.course.id);

    // A second scan is idempotent, not a conflict.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/student/attendance/qr",
            Some(&bearer(scanner)),
            json!({ "token": token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entries = db::models::attendance_group::Model::entries(&db, fixture.course.id, day())
        .await
        .unwrap();
    assert_eq!(entries.len(), fixture.students.len());
}

#[tokio::test]
#[serial]
async fn scan_is_rejected_outside_the_window() {
    let (app, db) = make_test_app(at(16, 0)).await;
    let fixture = seed_basic(&db).await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/teacher/courses/{}/qr", fixture.course.id),
            Some(&bearer(&fixture.teacher)),
            json!({}),
        ))
        .await
        .unwrap();
    let token = body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_owned();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/student/attendance/qr",
            Some(&bearer(&fixture.students[0])),
            json!({ "token": token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Attendance window is closed");
}

#[tokio::test]
#[serial]
async fn stale_or_forged_tokens_are_rejected() {
    let (app, db) = make_test_app(at(9, 2)).await;
    let fixture = seed_basic(&db).await;
    let auth = bearer(&fixture.students[0]);

    // Garbage.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/student/attendance/qr",
            Some(&auth),
            json!({ "token": "not-a-token" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correctly signed but already expired. Leeway is zero, so even a
    // just-expired token is dead.
    let expired = encode(
        &Header::default(),
        &json!({
            "sub": "qr_attendance_marker",
            "course_id": fixture.course.id,
            "iat": chrono::Utc::now().timestamp() - 120,
            "exp": chrono::Utc::now().timestamp() - 10,
        }),
        &EncodingKey::from_secret("test_secret".as_bytes()),
    )
    .unwrap();
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/student/attendance/qr",
            Some(&auth),
            json!({ "token": expired }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A login JWT is not a marker token, even though the key matches.
    let login_token = bearer(&fixture.students[0]).replace("Bearer ", "");
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/student/attendance/qr",
            Some(&auth),
            json!({ "token": login_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn scan_requires_enrollment_in_the_course_cohort() {
    let (app, db) = make_test_app(at(9, 2)).await;
    let fixture = seed_basic(&db).await;

    // A student with no profile in the course's class group.
    let outsider = db::models::user::Model::create(
        &db,
        "Outsider",
        "outsider@test.local",
        "student-pw",
        db::models::user::Role::Student,
    )
    .await
    .unwrap();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/teacher/courses/{}/qr", fixture.course.id),
            Some(&bearer(&fixture.teacher)),
            json!({}),
        ))
        .await
        .unwrap();
    let token = body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_owned();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/student/attendance/qr",
            Some(&bearer(&outsider)),
            json!({ "token": token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["message"], "You are not enrolled in this course");
}
