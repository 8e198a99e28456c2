use api::routes::routes;
use axum::{Router, body::Body, http::Request, response::Response};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use std::convert::Infallible;
use std::sync::Arc;
use tower::ServiceExt;
use tower::util::BoxCloneService;
use util::clock::FixedClock;
use util::state::AppState;

/// Builds a GET request, optionally authenticated.
pub fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

/// Builds a JSON request with the given method.
pub fn send_json(
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Collects a response body into JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Environment the config layer needs before anything touches it.
pub fn init_test_env() {
    unsafe {
        std::env::set_var("APP_ENV", "test");
        std::env::set_var("DATABASE_PATH", "sqlite::memory:");
        std::env::set_var("JWT_SECRET", "test_secret");
    }
}

/// Builds the app against a fresh in-memory database with the clock pinned
/// to `now`, so every window decision in a test is deterministic.
pub async fn make_test_app(
    now: NaiveDateTime,
) -> (
    BoxCloneService<Request<Body>, Response, Infallible>,
    DatabaseConnection,
) {
    init_test_env();
    let db = db::test_utils::setup_test_db().await;
    let app_state = AppState::new(db.clone(), Arc::new(FixedClock(now)));
    let router: Router = Router::new().nest("/api", routes(app_state));
    (router.into_service().boxed_clone(), db)
}
