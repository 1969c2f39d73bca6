pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::review::{handlers, intake::MAX_UPLOAD_BYTES};
use crate::state::AppState;

/// Headroom over the upload ceiling so the intake guard, not the framework, rejects
/// oversized résumés with its own message.
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Review API
        .route("/api/v1/reviews", post(handlers::handle_review))
        .route("/api/v1/reviews/pdf", post(handlers::handle_report_pdf))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
