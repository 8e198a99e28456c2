use sea_orm::DbErr;
use thiserror::Error;

/// Domain rejections surfaced by the attendance core.
///
/// Everything here is a deterministic rejection of the current attempt, not a
/// fault: callers are expected to correct the condition (wait for a window,
/// request an unlock) and retry manually.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A group already exists for this (course, date).
    #[error("Attendance already marked for this session")]
    AlreadyMarked,

    /// No attendance group exists for this (course, date).
    #[error("No attendance recorded for this session")]
    GroupNotFound,

    /// The unlock request does not exist.
    #[error("Unlock request not found")]
    RequestNotFound,

    /// The unlock request already left the `Pending` state.
    #[error("Unlock request already resolved")]
    AlreadyResolved,

    /// The acting user does not own the course/teacher relationship in scope.
    #[error("Not authorized for this resource")]
    Unauthorized,

    #[error(transparent)]
    Db(#[from] DbErr),
}
