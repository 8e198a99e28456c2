use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

/// A scheduled course: one weekly meeting of a teacher with a class group.
///
/// The schedule (day of week, start/end time) is immutable once seeded;
/// timetable edits are handled out of band.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_code: String,
    pub course_name: String,
    /// The teacher who owns this course (FK to `users`).
    pub teacher_id: i64,
    /// The cohort attending this course.
    pub class_group_id: i64,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: i16,
    /// Scheduled start. `None` means no fixed slot; such courses are
    /// markable all day (see `attendance_policy::can_mark`).
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub class_room: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,

    #[sea_orm(
        belongs_to = "super::class_group::Entity",
        from = "Column::ClassGroupId",
        to = "super::class_group::Column::Id"
    )]
    ClassGroup,

    #[sea_orm(has_many = "super::attendance_group::Entity")]
    AttendanceGroups,

    #[sea_orm(has_many = "super::unlock_request::Entity")]
    UnlockRequests,
}

impl Related<super::class_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassGroup.def()
    }
}

impl Related<super::attendance_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceGroups.def()
    }
}

impl Related<super::unlock_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnlockRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn for_teacher(
        db: &DatabaseConnection,
        teacher_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::CourseCode)
            .all(db)
            .await
    }

    /// Today's timetable slice for a teacher, ordered by start time.
    /// `weekday` uses the same 0 = Monday encoding as `day_of_week`.
    pub async fn today_for_teacher(
        db: &DatabaseConnection,
        teacher_id: i64,
        weekday: i16,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .filter(Column::DayOfWeek.eq(weekday))
            .order_by_asc(Column::StartTime)
            .all(db)
            .await
    }

    /// True when `teacher_id` owns this course. Scope checks are explicit,
    /// never derived from ambient session state.
    pub fn owned_by(&self, teacher_id: i64) -> bool {
        self.teacher_id == teacher_id
    }
}
