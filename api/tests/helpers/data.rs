use chrono::{NaiveTime, Utc};
use db::models::{class_group, course, student_profile, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// One teacher with a Monday 09:00 course and a class of three students,
/// plus an admin. Enough to exercise every attendance flow.
pub struct Fixture {
    pub admin: user::Model,
    pub teacher: user::Model,
    pub students: Vec<user::Model>,
    pub course: course::Model,
}

pub async fn seed_basic(db: &DatabaseConnection) -> Fixture {
    let admin = user::Model::create(db, "Admin", "admin@test.local", "admin-pw", user::Role::Admin)
        .await
        .unwrap();
    let teacher = user::Model::create(
        db,
        "Priya Sharma",
        "priya@test.local",
        "teacher-pw",
        user::Role::Teacher,
    )
    .await
    .unwrap();

    let class = class_group::ActiveModel {
        name: Set("CS 2nd Year".into()),
        section: Set("A".into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let mut students = Vec::new();
    for i in 1..=3 {
        let student = user::Model::create(
            db,
            &format!("Student {i}"),
            &format!("student{i}@test.local"),
            "student-pw",
            user::Role::Student,
        )
        .await
        .unwrap();
        student_profile::ActiveModel {
            user_id: Set(student.id),
            roll_number: Set(format!("CS2-{i:03}")),
            class_group_id: Set(class.id),
        }
        .insert(db)
        .await
        .unwrap();
        students.push(student);
    }

    // Monday 09:00, matching the pinned test date 2026-03-02.
    let course = course::ActiveModel {
        course_code: Set("MATH201".into()),
        course_name: Set("Linear Algebra".into()),
        teacher_id: Set(teacher.id),
        class_group_id: Set(class.id),
        day_of_week: Set(0),
        start_time: Set(NaiveTime::from_hms_opt(9, 0, 0)),
        end_time: Set(NaiveTime::from_hms_opt(10, 0, 0)),
        class_room: Set(Some("B12".into())),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    Fixture {
        admin,
        teacher,
        students,
        course,
    }
}

/// A bearer token for `user`, signed the same way the login endpoint does it.
pub fn bearer(user: &user::Model) -> String {
    let (token, _) = api::auth::generate_jwt(user.id, user.role);
    format!("Bearer {token}")
}
