use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202606100001_create_users::Migration),
            Box::new(migrations::m202606100002_create_class_groups::Migration),
            Box::new(migrations::m202606100003_create_profiles::Migration),
            Box::new(migrations::m202606100004_create_courses::Migration),
            Box::new(migrations::m202606150001_create_attendance::Migration),
            Box::new(migrations::m202606150002_create_unlock_requests::Migration),
        ]
    }
}
