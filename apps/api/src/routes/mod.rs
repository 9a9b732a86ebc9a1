pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::wizard::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/credential",
            post(handlers::handle_submit_credential),
        )
        .route(
            "/api/v1/sessions/:id/general-info",
            post(handlers::handle_submit_general_info),
        )
        .route(
            "/api/v1/sessions/:id/prior-report",
            post(handlers::handle_submit_prior_report),
        )
        .route(
            "/api/v1/sessions/:id/visit-details",
            post(handlers::handle_submit_visit_details),
        )
        .route(
            "/api/v1/sessions/:id/report",
            get(handlers::handle_download_report),
        )
        .with_state(state)
}
