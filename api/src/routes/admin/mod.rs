use axum::{
    Router,
    routing::{get, post, put},
};
use util::state::AppState;

pub mod get;
pub mod post;
pub mod put;

use get::get_unlock_requests;
use post::resolve_unlock_request;
use put::set_group_lock;

/// Builds the `/admin` route group, behind the admin role guard.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/unlock-requests", get(get_unlock_requests))
        .route(
            "/unlock-requests/{request_id}/resolve",
            post(resolve_unlock_request),
        )
        .route("/attendance/{course_id}/{date}/lock", put(set_group_lock))
}
