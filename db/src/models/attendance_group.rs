use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use std::collections::HashMap;

use crate::attendance_policy::LockState;
use crate::error::DomainError;
use crate::models::attendance_entry::{self, AttendanceStatus};

/// The attendance aggregate for one (course, session date).
///
/// One row per session-day; the per-student entries hang off it and the lock
/// flag lives here alone, so "all records in a group share the lock" holds
/// structurally instead of by convention. A UNIQUE index on
/// (course_id, session_date) makes group creation exactly-once under
/// concurrent double-submission.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub session_date: NaiveDate,
    /// Set on creation; cleared only by an explicit admin unlock.
    pub locked: bool,
    /// The user who created the group (teacher, or the scanning student on
    /// the QR path).
    pub marked_by: i64,
    pub marked_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,

    #[sea_orm(has_many = "super::attendance_entry::Entity")]
    Entries,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::attendance_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One (student, status) pair in a create or update call.
#[derive(Clone, Debug)]
pub struct EntryChange {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

impl Model {
    pub async fn find_by_course_and_date(
        db: &DatabaseConnection,
        course_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::SessionDate.eq(date))
            .one(db)
            .await
    }

    /// The policy-facing lock state for one (course, date).
    pub async fn lock_state(
        db: &DatabaseConnection,
        course_id: i64,
        date: NaiveDate,
    ) -> Result<LockState, DbErr> {
        Ok(match Self::find_by_course_and_date(db, course_id, date).await? {
            None => LockState::NoGroup,
            Some(group) if group.locked => LockState::Locked,
            Some(_) => LockState::Unlocked,
        })
    }

    /// Group lock flag; absent group reads as unlocked / not-yet-marked.
    pub async fn is_locked(
        db: &DatabaseConnection,
        course_id: i64,
        date: NaiveDate,
    ) -> Result<bool, DbErr> {
        Ok(Self::lock_state(db, course_id, date).await? == LockState::Locked)
    }

    /// Entries of the group, or an empty list when no group exists yet.
    pub async fn entries(
        db: &DatabaseConnection,
        course_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<attendance_entry::Model>, DbErr> {
        let Some(group) = Self::find_by_course_and_date(db, course_id, date).await? else {
            return Ok(Vec::new());
        };
        attendance_entry::Entity::find()
            .filter(attendance_entry::Column::GroupId.eq(group.id))
            .all(db)
            .await
    }

    /// Creates the group and all its entries in one transaction.
    ///
    /// The only creation path — entries are never inserted individually.
    /// Fails with `AlreadyMarked` when a group exists; the unique index
    /// backstops the check-then-insert race so exactly one concurrent caller
    /// wins.
    pub async fn create_group(
        db: &DatabaseConnection,
        course_id: i64,
        date: NaiveDate,
        marked_by: i64,
        entries: &[EntryChange],
        now: NaiveDateTime,
    ) -> Result<Model, DomainError> {
        let txn = db.begin().await.map_err(DomainError::Db)?;

        if Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::SessionDate.eq(date))
            .one(&txn)
            .await
            .map_err(DomainError::Db)?
            .is_some()
        {
            return Err(DomainError::AlreadyMarked);
        }

        let group = match (ActiveModel {
            course_id: Set(course_id),
            session_date: Set(date),
            locked: Set(true),
            marked_by: Set(marked_by),
            marked_at: Set(now),
            ..Default::default()
        })
        .insert(&txn)
        .await
        {
            Ok(group) => group,
            // Lost the race to a concurrent creator.
            Err(e) if e.to_string().contains("UNIQUE") => return Err(DomainError::AlreadyMarked),
            Err(e) => return Err(DomainError::Db(e)),
        };

        if !entries.is_empty() {
            let rows: Vec<attendance_entry::ActiveModel> = entries
                .iter()
                .map(|entry| attendance_entry::ActiveModel {
                    group_id: Set(group.id),
                    student_id: Set(entry.student_id),
                    status: Set(entry.status),
                    marked_at: Set(now),
                })
                .collect();
            attendance_entry::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(DomainError::Db)?;
        }

        txn.commit().await.map_err(DomainError::Db)?;
        Ok(group)
    }

    /// Partial, idempotent status update, applied in one transaction.
    ///
    /// Only students with an existing entry whose status actually differs get
    /// a new status and `marked_at`; everything else is untouched. A failure
    /// part-way through rolls the whole change set back. Returns how many
    /// entries changed.
    pub async fn update_statuses(
        db: &DatabaseConnection,
        course_id: i64,
        date: NaiveDate,
        changes: &[EntryChange],
        now: NaiveDateTime,
    ) -> Result<usize, DomainError> {
        let txn = db.begin().await.map_err(DomainError::Db)?;

        let group = Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::SessionDate.eq(date))
            .one(&txn)
            .await
            .map_err(DomainError::Db)?
            .ok_or(DomainError::GroupNotFound)?;

        let existing: HashMap<i64, attendance_entry::Model> = attendance_entry::Entity::find()
            .filter(attendance_entry::Column::GroupId.eq(group.id))
            .all(&txn)
            .await
            .map_err(DomainError::Db)?
            .into_iter()
            .map(|entry| (entry.student_id, entry))
            .collect();

        let mut updated = 0;
        for change in changes {
            let Some(entry) = existing.get(&change.student_id) else {
                continue;
            };
            if entry.status == change.status {
                continue;
            }
            let mut active: attendance_entry::ActiveModel = entry.clone().into();
            active.status = Set(change.status);
            active.marked_at = Set(now);
            active.update(&txn).await.map_err(DomainError::Db)?;
            updated += 1;
        }

        txn.commit().await.map_err(DomainError::Db)?;
        Ok(updated)
    }

    /// Sets or clears the group's lock flag — the admin unlock path for an
    /// already-existing group. Approving an unlock request does NOT call
    /// this; the two signals stay independent.
    pub async fn set_locked(
        db: &DatabaseConnection,
        course_id: i64,
        date: NaiveDate,
        locked: bool,
    ) -> Result<Model, DomainError> {
        let group = Self::find_by_course_and_date(db, course_id, date)
            .await
            .map_err(DomainError::Db)?
            .ok_or(DomainError::GroupNotFound)?;
        let mut active: ActiveModel = group.into();
        active.locked = Set(locked);
        active.update(db).await.map_err(DomainError::Db)
    }

    /// QR-channel mark for a single student.
    ///
    /// With a group present this is a targeted upsert of that one entry
    /// (never `AlreadyMarked`). Without one, the group is created from the
    /// course roster with everyone else `Absent` and the scanner `Present`.
    pub async fn mark_single(
        db: &DatabaseConnection,
        course: &super::course::Model,
        date: NaiveDate,
        student_id: i64,
        now: NaiveDateTime,
    ) -> Result<(), DomainError> {
        if let Some(group) = Self::find_by_course_and_date(db, course.id, date)
            .await
            .map_err(DomainError::Db)?
        {
            let existing = attendance_entry::Entity::find_by_id((group.id, student_id))
                .one(db)
                .await
                .map_err(DomainError::Db)?;
            match existing {
                Some(entry) if entry.status == AttendanceStatus::Present => {}
                Some(entry) => {
                    let mut active: attendance_entry::ActiveModel = entry.into();
                    active.status = Set(AttendanceStatus::Present);
                    active.marked_at = Set(now);
                    active.update(db).await.map_err(DomainError::Db)?;
                }
                None => {
                    attendance_entry::ActiveModel {
                        group_id: Set(group.id),
                        student_id: Set(student_id),
                        status: Set(AttendanceStatus::Present),
                        marked_at: Set(now),
                    }
                    .insert(db)
                    .await
                    .map_err(DomainError::Db)?;
                }
            }
            return Ok(());
        }

        let roster = super::student_profile::Model::roster(db, course.class_group_id)
            .await
            .map_err(DomainError::Db)?;
        let entries: Vec<EntryChange> = roster
            .into_iter()
            .map(|(profile, _)| EntryChange {
                student_id: profile.user_id,
                status: if profile.user_id == student_id {
                    AttendanceStatus::Present
                } else {
                    AttendanceStatus::Absent
                },
            })
            .collect();
        Self::create_group(db, course.id, date, student_id, &entries, now)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{class_group, course, student_profile, user};
    use crate::test_utils::setup_test_db;
    use chrono::{NaiveDate, Utc};
    use sea_orm::Set;

    async fn seed(db: &DatabaseConnection) -> (course::Model, Vec<i64>) {
        let teacher = user::Model::create(db, "T One", "t1@test.local", "pw", user::Role::Teacher)
            .await
            .unwrap();
        let class = class_group::ActiveModel {
            name: Set("CS-2".into()),
            section: Set("A".into()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        let mut students = Vec::new();
        for i in 0..3 {
            let u = user::Model::create(
                db,
                &format!("S {i}"),
                &format!("s{i}@test.local"),
                "pw",
                user::Role::Student,
            )
            .await
            .unwrap();
            student_profile::ActiveModel {
                user_id: Set(u.id),
                roll_number: Set(format!("R-{i}")),
                class_group_id: Set(class.id),
            }
            .insert(db)
            .await
            .unwrap();
            students.push(u.id);
        }

        let course = course::ActiveModel {
            course_code: Set("MATH101".into()),
            course_name: Set("Calculus".into()),
            teacher_id: Set(teacher.id),
            class_group_id: Set(class.id),
            day_of_week: Set(0),
            start_time: Set(chrono::NaiveTime::from_hms_opt(9, 0, 0)),
            end_time: Set(chrono::NaiveTime::from_hms_opt(10, 0, 0)),
            class_room: Set(Some("B12".into())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        (course, students)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn everyone(students: &[i64], status: AttendanceStatus) -> Vec<EntryChange> {
        students
            .iter()
            .map(|&student_id| EntryChange { student_id, status })
            .collect()
    }

    #[tokio::test]
    async fn create_group_is_exactly_once() {
        let db = setup_test_db().await;
        let (course, students) = seed(&db).await;
        let entries = everyone(&students, AttendanceStatus::Present);

        let group =
            Model::create_group(&db, course.id, day(), course.teacher_id, &entries, at(9, 5))
                .await
                .unwrap();
        assert!(group.locked);

        let second =
            Model::create_group(&db, course.id, day(), course.teacher_id, &entries, at(9, 6)).await;
        assert!(matches!(second, Err(DomainError::AlreadyMarked)));

        // Exactly one group with N entries exists afterwards.
        let rows = Model::entries(&db, course.id, day()).await.unwrap();
        assert_eq!(rows.len(), students.len());
        assert_eq!(
            Model::lock_state(&db, course.id, day()).await.unwrap(),
            LockState::Locked
        );
    }

    #[tokio::test]
    async fn concurrent_group_creation_has_one_winner() {
        let db = setup_test_db().await;
        let (course, students) = seed(&db).await;
        let entries = everyone(&students, AttendanceStatus::Present);

        let (a, b) = tokio::join!(
            Model::create_group(&db, course.id, day(), course.teacher_id, &entries, at(9, 5)),
            Model::create_group(&db, course.id, day(), course.teacher_id, &entries, at(9, 5)),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(DomainError::AlreadyMarked)))
        );

        // The winner's group is complete, nothing from the loser leaked in.
        let rows = Model::entries(&db, course.id, day()).await.unwrap();
        assert_eq!(rows.len(), students.len());
    }

    #[tokio::test]
    async fn update_statuses_is_partial_and_idempotent() {
        let db = setup_test_db().await;
        let (course, students) = seed(&db).await;
        Model::create_group(
            &db,
            course.id,
            day(),
            course.teacher_id,
            &everyone(&students, AttendanceStatus::Present),
            at(9, 5),
        )
        .await
        .unwrap();

        let change = [EntryChange {
            student_id: students[0],
            status: AttendanceStatus::Absent,
        }];
        let updated = Model::update_statuses(&db, course.id, day(), &change, at(9, 30))
            .await
            .unwrap();
        assert_eq!(updated, 1);

        // Same change again: status unchanged, so no second marked_at bump.
        let updated = Model::update_statuses(&db, course.id, day(), &change, at(9, 45))
            .await
            .unwrap();
        assert_eq!(updated, 0);
        let rows = Model::entries(&db, course.id, day()).await.unwrap();
        let entry = rows.iter().find(|e| e.student_id == students[0]).unwrap();
        assert_eq!(entry.status, AttendanceStatus::Absent);
        assert_eq!(entry.marked_at, at(9, 30));

        // Untouched students keep their creation timestamp.
        let other = rows.iter().find(|e| e.student_id == students[1]).unwrap();
        assert_eq!(other.marked_at, at(9, 5));
    }

    #[tokio::test]
    async fn update_applies_the_whole_change_set_together() {
        let db = setup_test_db().await;
        let (course, students) = seed(&db).await;
        Model::create_group(
            &db,
            course.id,
            day(),
            course.teacher_id,
            &everyone(&students, AttendanceStatus::Present),
            at(9, 5),
        )
        .await
        .unwrap();

        // Every entry flips in one call; all of them carry the same marked_at
        // because the updates commit as a single transaction.
        let updated = Model::update_statuses(
            &db,
            course.id,
            day(),
            &everyone(&students, AttendanceStatus::Late),
            at(9, 30),
        )
        .await
        .unwrap();
        assert_eq!(updated, students.len());

        let rows = Model::entries(&db, course.id, day()).await.unwrap();
        assert!(rows.iter().all(|e| e.status == AttendanceStatus::Late));
        assert!(rows.iter().all(|e| e.marked_at == at(9, 30)));
    }

    #[tokio::test]
    async fn update_without_group_is_not_found() {
        let db = setup_test_db().await;
        let (course, students) = seed(&db).await;
        let res = Model::update_statuses(
            &db,
            course.id,
            day(),
            &everyone(&students, AttendanceStatus::Late),
            at(9, 30),
        )
        .await;
        assert!(matches!(res, Err(DomainError::GroupNotFound)));
        assert!(Model::entries(&db, course.id, day()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_locked_flips_the_group_flag() {
        let db = setup_test_db().await;
        let (course, students) = seed(&db).await;
        Model::create_group(
            &db,
            course.id,
            day(),
            course.teacher_id,
            &everyone(&students, AttendanceStatus::Present),
            at(9, 5),
        )
        .await
        .unwrap();

        assert!(Model::is_locked(&db, course.id, day()).await.unwrap());
        Model::set_locked(&db, course.id, day(), false).await.unwrap();
        assert_eq!(
            Model::lock_state(&db, course.id, day()).await.unwrap(),
            LockState::Unlocked
        );

        let missing = Model::set_locked(&db, course.id, day().succ_opt().unwrap(), false).await;
        assert!(matches!(missing, Err(DomainError::GroupNotFound)));
    }

    #[tokio::test]
    async fn mark_single_seeds_roster_when_no_group_exists() {
        let db = setup_test_db().await;
        let (course, students) = seed(&db).await;

        Model::mark_single(&db, &course, day(), students[1], at(9, 2))
            .await
            .unwrap();

        let rows = Model::entries(&db, course.id, day()).await.unwrap();
        assert_eq!(rows.len(), students.len());
        for entry in &rows {
            let expected = if entry.student_id == students[1] {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            assert_eq!(entry.status, expected);
        }
    }

    #[tokio::test]
    async fn mark_single_upserts_into_existing_group() {
        let db = setup_test_db().await;
        let (course, students) = seed(&db).await;
        Model::create_group(
            &db,
            course.id,
            day(),
            course.teacher_id,
            &everyone(&students, AttendanceStatus::Absent),
            at(9, 0),
        )
        .await
        .unwrap();

        // Never AlreadyMarked on the scan path.
        Model::mark_single(&db, &course, day(), students[2], at(9, 4))
            .await
            .unwrap();
        let rows = Model::entries(&db, course.id, day()).await.unwrap();
        let entry = rows.iter().find(|e| e.student_id == students[2]).unwrap();
        assert_eq!(entry.status, AttendanceStatus::Present);
        assert_eq!(rows.len(), students.len());
    }
}
