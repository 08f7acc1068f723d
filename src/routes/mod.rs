pub mod admin;
pub mod health;
pub mod practice;
pub mod quiz;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};

use crate::middleware::{
    auth::require_admin,
    rate_limit::{self, RateLimiter, Scope},
};
use crate::AppState;

/// Test taking and practice endpoints. Sessions are identified by the
/// `X-Session-Key` header, which also keys the request rate window.
pub fn public_router(rps: u32) -> Router<AppState> {
    Router::new()
        .route("/api/tests", get(quiz::list_tests))
        .route("/api/tests/:category_id/start", post(quiz::start_session))
        .route(
            "/api/sessions/:session_id",
            get(quiz::get_session).post(quiz::submit_session),
        )
        .route("/api/sessions/:session_id/results", get(quiz::session_results))
        .route("/api/practice", get(practice::list_practice_questions))
        .route(
            "/api/practice/:id",
            get(practice::get_practice_question).post(practice::check_practice_answer),
        )
        .layer(from_fn_with_state(
            RateLimiter::new(rps, Scope::PerSessionKey),
            rate_limit::rps_middleware,
        ))
}

/// Question bank administration, admin bearer token required.
pub fn admin_router(rps: u32) -> Router<AppState> {
    Router::new()
        .route("/api/admin/categories", post(admin::create_category))
        .route(
            "/api/admin/categories/:category_id",
            get(admin::get_category).delete(admin::delete_category),
        )
        .route(
            "/api/admin/categories/:category_id/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route(
            "/api/admin/categories/:category_id/import",
            post(admin::import_questions),
        )
        .route(
            "/api/admin/practice",
            post(admin::create_practice_question),
        )
        .route(
            "/api/admin/practice/:id",
            axum::routing::patch(admin::update_practice_question),
        )
        .layer(from_fn(require_admin))
        .layer(from_fn_with_state(
            RateLimiter::new(rps, Scope::Shared),
            rate_limit::rps_middleware,
        ))
}

/// Every route, with state applied.
pub fn app(state: AppState, public_rps: u32, admin_rps: u32) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .merge(public_router(public_rps))
        .merge(admin_router(admin_rps))
        .with_state(state)
}
