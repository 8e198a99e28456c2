use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

use get::get_history;
use post::redeem_qr;

/// Builds the `/student` route group, behind the student role guard.
pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/attendance", get(get_history))
        .route("/attendance/qr", post(redeem_qr))
}
