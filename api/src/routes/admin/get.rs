use crate::response::ApiResponse;
use crate::routes::common::{ErrorResponse, db_error};
use axum::{Json, extract::State, response::IntoResponse};
use db::models::unlock_request;
use util::state::AppState;

/// GET /admin/unlock-requests
///
/// The full review queue, newest first. Duplicate requests for the same
/// (course, date) all appear; resolving any one of them is enough to flip
/// the approved signal.
pub async fn get_unlock_requests(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let requests = unlock_request::Model::all_newest_first(app_state.db())
        .await
        .map_err(db_error)?;
    Ok(Json(ApiResponse::success(
        requests,
        "Unlock requests retrieved successfully",
    )))
}
