//! Error plumbing shared by every route group.

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use axum::{Json, http::StatusCode};

/// Uniform early-return error shape for handlers.
pub type ErrorResponse = (StatusCode, Json<ApiResponse<Empty>>);

pub fn db_error(e: impl std::fmt::Display) -> ErrorResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(format!("Database error: {e}"))),
    )
}
