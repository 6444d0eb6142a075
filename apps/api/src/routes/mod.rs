pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extraction::handlers::handle_parse_resume;
use crate::register::handlers::handle_get_register;
use crate::scanning::handlers::handle_scrape;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/parse-resume", post(handle_parse_resume))
        .route("/api/v1/scrape", post(handle_scrape))
        .route("/api/v1/getRegister", get(handle_get_register))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
