use axum::{extract::State, Json};
use serde_json::Value;

use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/getRegister
///
/// Raw profile keys (`name`, `domain`, ...); the extension normalizes them.
pub async fn handle_get_register(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state
        .register
        .latest()
        .await
        .map(|record| Json(Value::Object(record)))
        .ok_or_else(|| AppError::NotFound("No resume has been parsed yet".to_string()))
}
