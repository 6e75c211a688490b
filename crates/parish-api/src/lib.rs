//! # Parish API
//!
//! HTTP handlers, extractors and the response envelope.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

use handlers::{balance, health, obligations, tenants};
use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/tenants/verify", post(tenants::verify))
        .route("/api/v1/balance", get(balance::monthly))
        .route(
            "/api/v1/obligations/{kind}",
            get(obligations::list).post(obligations::register),
        )
        .route(
            "/api/v1/obligations/{kind}/{id}",
            get(obligations::get)
                .put(obligations::update)
                .delete(obligations::delete),
        )
        .with_state(state)
}
