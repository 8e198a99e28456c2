use axum::{Router, routing::post};
use util::state::AppState;

pub mod post;

use post::login;

/// Builds the `/auth` route group (public).
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
