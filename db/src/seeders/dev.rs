//! Development seed data: one admin, one teacher with a class of students,
//! and a small timetable to click around in.

use chrono::{NaiveTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::models::{class_group, course, student_profile, teacher_profile, user};

pub async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    user::Model::create(db, "Admin", "admin@rollcall.local", "admin123", user::Role::Admin).await?;

    let teacher = user::Model::create(
        db,
        "Priya Sharma",
        "priya@rollcall.local",
        "teacher123",
        user::Role::Teacher,
    )
    .await?;
    teacher_profile::ActiveModel {
        user_id: Set(teacher.id),
        phone: Set(Some("+91-98000-00000".into())),
        department: Set(Some("Mathematics".into())),
    }
    .insert(db)
    .await?;

    let class = class_group::ActiveModel {
        name: Set("CS 2nd Year".into()),
        section: Set("A".into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for i in 1..=5 {
        let student = user::Model::create(
            db,
            &format!("Student {i}"),
            &format!("student{i}@rollcall.local"),
            "student123",
            user::Role::Student,
        )
        .await?;
        student_profile::ActiveModel {
            user_id: Set(student.id),
            roll_number: Set(format!("CS2-{i:03}")),
            class_group_id: Set(class.id),
        }
        .insert(db)
        .await?;
    }

    let slots = [
        ("MATH201", "Linear Algebra", 0, Some((9, 0))),
        ("MATH202", "Calculus II", 2, Some((11, 0))),
        // A course with no fixed slot, markable all day.
        ("MATH290", "Tutorial", 4, None),
    ];
    for (code, name, dow, start) in slots {
        course::ActiveModel {
            course_code: Set(code.into()),
            course_name: Set(name.into()),
            teacher_id: Set(teacher.id),
            class_group_id: Set(class.id),
            day_of_week: Set(dow),
            start_time: Set(start.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0))),
            end_time: Set(start.and_then(|(h, m)| NaiveTime::from_hms_opt(h + 1, m, 0))),
            class_room: Set(Some("B12".into())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    tracing::info!("Seeded dev data: 1 admin, 1 teacher, 5 students, 3 courses");
    Ok(())
}
