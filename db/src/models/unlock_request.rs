use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::attendance_policy::UnlockSignals;
use crate::error::DomainError;

/// A teacher's request to re-open a locked session-day.
///
/// Created `Pending`; transitions exactly once to `Approved` or `Rejected`
/// and is terminal thereafter. Duplicates for the same (course, date) are
/// permitted — consumers only observe "any approved" / "any pending".
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "unlock_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub teacher_id: i64,
    pub session_date: NaiveDate,
    pub reason: String,
    /// Free-form tag supplied by the requesting UI (e.g. "GENERAL").
    pub request_type: String,
    pub status: RequestStatus,
    pub created_at: NaiveDateTime,
    /// Null until resolved.
    pub processed_at: Option<NaiveDateTime>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "unlock_request_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RequestStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "approved")]
    Approved,

    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Files a new request. Always lands in `Pending`; no uniqueness
    /// constraint applies.
    pub async fn create(
        db: &DatabaseConnection,
        teacher_id: i64,
        course_id: i64,
        session_date: NaiveDate,
        reason: &str,
        request_type: &str,
        now: NaiveDateTime,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            course_id: Set(course_id),
            teacher_id: Set(teacher_id),
            session_date: Set(session_date),
            reason: Set(reason.to_owned()),
            request_type: Set(request_type.to_owned()),
            status: Set(RequestStatus::Pending),
            created_at: Set(now),
            processed_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn for_teacher(
        db: &DatabaseConnection,
        teacher_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    /// Admin review queue, newest first.
    pub async fn all_newest_first(db: &DatabaseConnection) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    /// The two facts the window policy and classifier consume.
    pub async fn signals_for(
        db: &DatabaseConnection,
        course_id: i64,
        session_date: NaiveDate,
    ) -> Result<UnlockSignals, DbErr> {
        let requests = Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::SessionDate.eq(session_date))
            .all(db)
            .await?;
        Ok(UnlockSignals {
            any_approved: requests.iter().any(|r| r.status == RequestStatus::Approved),
            any_pending: requests.iter().any(|r| r.status == RequestStatus::Pending),
        })
    }

    /// Resolves a pending request, exactly once.
    ///
    /// The terminal transition is a compare-and-swap on the status column, so
    /// of two concurrent resolutions exactly one wins and the other sees
    /// `AlreadyResolved`. Approval does not touch any attendance group's lock
    /// flag.
    pub async fn resolve(
        db: &DatabaseConnection,
        request_id: i64,
        approve: bool,
        resolver_id: i64,
        resolver_is_admin: bool,
        now: NaiveDateTime,
    ) -> Result<Model, DomainError> {
        let request = Entity::find_by_id(request_id)
            .one(db)
            .await
            .map_err(DomainError::Db)?
            .ok_or(DomainError::RequestNotFound)?;

        if !resolver_is_admin && request.teacher_id != resolver_id {
            return Err(DomainError::Unauthorized);
        }
        if request.status != RequestStatus::Pending {
            return Err(DomainError::AlreadyResolved);
        }

        let target = if approve {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };
        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(target))
            .col_expr(Column::ProcessedAt, Expr::value(now))
            .filter(Column::Id.eq(request_id))
            .filter(Column::Status.eq(RequestStatus::Pending))
            .exec(db)
            .await
            .map_err(DomainError::Db)?;
        if result.rows_affected == 0 {
            // Raced another resolver and lost.
            return Err(DomainError::AlreadyResolved);
        }

        Entity::find_by_id(request_id)
            .one(db)
            .await
            .map_err(DomainError::Db)?
            .ok_or(DomainError::RequestNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{class_group, course, user};
    use crate::test_utils::setup_test_db;
    use chrono::{NaiveDate, Utc};

    async fn seed(db: &DatabaseConnection) -> (user::Model, user::Model, course::Model) {
        let admin = user::Model::create(db, "Admin", "admin@test.local", "pw", user::Role::Admin)
            .await
            .unwrap();
        let teacher = user::Model::create(db, "T", "t@test.local", "pw", user::Role::Teacher)
            .await
            .unwrap();
        let class = class_group::ActiveModel {
            name: Set("CS-1".into()),
            section: Set("B".into()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        let course = course::ActiveModel {
            course_code: Set("PHY101".into()),
            course_name: Set("Physics".into()),
            teacher_id: Set(teacher.id),
            class_group_id: Set(class.id),
            day_of_week: Set(2),
            start_time: Set(chrono::NaiveTime::from_hms_opt(11, 0, 0)),
            end_time: Set(chrono::NaiveTime::from_hms_opt(12, 0, 0)),
            class_room: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        (admin, teacher, course)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn resolve_is_exactly_once() {
        let db = setup_test_db().await;
        let (admin, teacher, course) = seed(&db).await;
        let req = Model::create(&db, teacher.id, course.id, day(), "forgot", "GENERAL", at(12, 0))
            .await
            .unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert!(req.processed_at.is_none());

        let resolved = Model::resolve(&db, req.id, true, admin.id, true, at(13, 0))
            .await
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Approved);
        assert_eq!(resolved.processed_at, Some(at(13, 0)));

        // Terminal: a second resolution loses, approve or reject alike.
        let again = Model::resolve(&db, req.id, false, admin.id, true, at(13, 1)).await;
        assert!(matches!(again, Err(DomainError::AlreadyResolved)));
    }

    #[tokio::test]
    async fn concurrent_resolutions_have_one_winner() {
        let db = setup_test_db().await;
        let (admin, teacher, course) = seed(&db).await;
        let req = Model::create(&db, teacher.id, course.id, day(), "forgot", "GENERAL", at(12, 0))
            .await
            .unwrap();

        // Two admins vote at once, in opposite directions. The status CAS
        // lets exactly one through; the other observes the terminal state.
        let (a, b) = tokio::join!(
            Model::resolve(&db, req.id, true, admin.id, true, at(13, 0)),
            Model::resolve(&db, req.id, false, admin.id, true, at(13, 0)),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(DomainError::AlreadyResolved)))
        );

        let stored = Entity::find_by_id(req.id).one(&db).await.unwrap().unwrap();
        assert_ne!(stored.status, RequestStatus::Pending);
        assert_eq!(stored.processed_at, Some(at(13, 0)));
    }

    #[tokio::test]
    async fn resolve_checks_scope_and_existence() {
        let db = setup_test_db().await;
        let (_admin, teacher, course) = seed(&db).await;
        let outsider = user::Model::create(&db, "X", "x@test.local", "pw", user::Role::Teacher)
            .await
            .unwrap();
        let req = Model::create(&db, teacher.id, course.id, day(), "forgot", "GENERAL", at(12, 0))
            .await
            .unwrap();

        let missing = Model::resolve(&db, req.id + 999, true, teacher.id, false, at(13, 0)).await;
        assert!(matches!(missing, Err(DomainError::RequestNotFound)));

        let foreign = Model::resolve(&db, req.id, true, outsider.id, false, at(13, 0)).await;
        assert!(matches!(foreign, Err(DomainError::Unauthorized)));
    }

    #[tokio::test]
    async fn signals_aggregate_duplicates() {
        let db = setup_test_db().await;
        let (admin, teacher, course) = seed(&db).await;

        assert_eq!(
            Model::signals_for(&db, course.id, day()).await.unwrap(),
            UnlockSignals::default()
        );

        let first = Model::create(&db, teacher.id, course.id, day(), "a", "GENERAL", at(12, 0))
            .await
            .unwrap();
        // Duplicate pending requests for the same (course, date) are allowed.
        Model::create(&db, teacher.id, course.id, day(), "b", "GENERAL", at(12, 5))
            .await
            .unwrap();

        let signals = Model::signals_for(&db, course.id, day()).await.unwrap();
        assert!(signals.any_pending && !signals.any_approved);

        Model::resolve(&db, first.id, true, admin.id, true, at(13, 0))
            .await
            .unwrap();
        let signals = Model::signals_for(&db, course.id, day()).await.unwrap();
        assert!(signals.any_pending && signals.any_approved);
    }
}
