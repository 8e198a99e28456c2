use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::error::DomainError;
use db::models::unlock_request;
use serde::Deserialize;
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub approve: bool,
}

/// POST /admin/unlock-requests/{request_id}/resolve
///
/// Approves or rejects a pending request. The transition is terminal and
/// happens exactly once; a second resolution attempt gets `409 Conflict`
/// whichever way it voted. Approval does not touch any group's lock flag,
/// that stays a separate admin action.
pub async fn resolve_unlock_request(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(request_id): Path<i64>,
    Json(req): Json<ResolveRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match unlock_request::Model::resolve(
        app_state.db(),
        request_id,
        req.approve,
        claims.sub,
        true,
        app_state.now(),
    )
    .await
    {
        Ok(request) => {
            let message = if req.approve {
                "Unlock request approved"
            } else {
                "Unlock request rejected"
            };
            Ok(Json(ApiResponse::success(request, message)))
        }
        Err(DomainError::RequestNotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Unlock request not found")),
        )),
        Err(DomainError::AlreadyResolved) => Err((
            StatusCode::CONFLICT,
            Json(ApiResponse::error("Unlock request already resolved")),
        )),
        Err(e) => Err(db_error(e)),
    }
}
