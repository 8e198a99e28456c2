//! Application state container shared across Axum route handlers.
//!
//! Holds the database connection and the campus clock. It is cloned into each
//! handler via Axum's `State<T>` extractor.

use crate::clock::Clock;
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Central application state shared across the server.
///
/// This includes:
/// - A cloned, thread-safe database connection for use with SeaORM.
/// - The [`Clock`] every time-window decision is evaluated against.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection and clock.
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Current campus-local date/time.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Today's campus-local date.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
