use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One student's status inside an attendance group.
///
/// The composite key hangs the entry off its group row; the lock flag lives
/// on the group alone.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,

    pub status: AttendanceStatus,
    pub marked_at: NaiveDateTime,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "late")]
    Late,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_group::Entity",
        from = "Column::GroupId",
        to = "super::attendance_group::Column::Id"
    )]
    Group,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::attendance_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A student's own history, newest group date filtering left to the
    /// caller-supplied range. Optional course filter.
    pub async fn history_for_student(
        db: &DatabaseConnection,
        student_id: i64,
        course_id: Option<i64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(Model, Option<super::attendance_group::Model>)>, DbErr> {
        let mut query = Entity::find()
            .find_also_related(super::attendance_group::Entity)
            .filter(Column::StudentId.eq(student_id))
            .filter(super::attendance_group::Column::SessionDate.between(from, to));
        if let Some(course_id) = course_id {
            query = query.filter(super::attendance_group::Column::CourseId.eq(course_id));
        }
        query.all(db).await
    }

    /// (total sessions recorded, sessions present) for one student in one
    /// course — the inputs of the attendance percentage.
    pub async fn performance_counts(
        db: &DatabaseConnection,
        course_id: i64,
        student_id: i64,
    ) -> Result<(u64, u64), DbErr> {
        let base = || {
            Entity::find()
                .join(JoinType::InnerJoin, Relation::Group.def())
                .filter(Column::StudentId.eq(student_id))
                .filter(super::attendance_group::Column::CourseId.eq(course_id))
        };
        let total = base().count(db).await?;
        let present = base()
            .filter(Column::Status.eq(AttendanceStatus::Present))
            .count(db)
            .await?;
        Ok((total, present))
    }
}
