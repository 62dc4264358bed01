use super::{error_response, with_store};
use crate::services::diagnostics::debug_mms_database;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn debug_mms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let identity = state.identity.clone();
    let result = with_store(&state, move |store| debug_mms_database(store, &identity)).await;

    match result {
        Ok(Ok(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(Err(e)) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "E_DEBUG",
            format!("Failed to inspect message store: {}", e),
        ),
        Err(response) => response,
    }
}
