use super::{error_response, with_store};
use crate::models::{CachePartRequest, MediaQueryParams};
use crate::services::cache::{copy_part_to_cache, parse_part_reference, CacheError};
use crate::services::media::get_mms_media;
use crate::state::AppState;
use crate::store::RecordStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::error;

pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MediaQueryParams>,
) -> impl IntoResponse {
    let address = params.address.unwrap_or_default();
    let from = params.from;
    let to = params
        .to
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let options = state.settings.engine_options();

    let result = with_store(&state, move |store| {
        get_mms_media(store, &address, from, to, &options)
    })
    .await;

    match result {
        Ok(Ok(messages)) => (StatusCode::OK, Json(messages)).into_response(),
        Ok(Err(e)) => error_response(StatusCode::BAD_REQUEST, e.code(), e.to_string()),
        Err(response) => response,
    }
}

pub async fn get_part(
    State(state): State<Arc<AppState>>,
    Path(part_id): Path<String>,
) -> impl IntoResponse {
    let Some(part_id) = parse_part_reference(&part_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid part id").into_response();
    };

    let result = with_store(&state, move |store| store.open_part(&part_id)).await;

    match result {
        Ok(Ok(Some(blob))) => {
            let content_type = blob
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            (
                StatusCode::OK,
                [
                    ("Content-Type", content_type.as_str()),
                    ("Cache-Control", "max-age=86400"),
                ],
                blob.bytes,
            )
                .into_response()
        }
        Ok(Ok(None)) => (StatusCode::NOT_FOUND, "Part not found").into_response(),
        Ok(Err(e)) => {
            error!(target: "server", "Failed to read part: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read part: {}", e),
            )
                .into_response()
        }
        Err(response) => response,
    }
}

pub async fn cache_part(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CachePartRequest>,
) -> impl IntoResponse {
    let cache_dir = state.settings.cache_dir.clone();
    let result = with_store(&state, move |store| {
        copy_part_to_cache(store, &request.uri, &cache_dir)
    })
    .await;

    match result {
        Ok(Ok(cached)) => (StatusCode::OK, Json(cached)).into_response(),
        Ok(Err(e)) => {
            let status = match e {
                CacheError::InvalidUri(_) => StatusCode::BAD_REQUEST,
                CacheError::OpenStream(_) => StatusCode::NOT_FOUND,
                CacheError::Copy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.code(), e.to_string())
        }
        Err(response) => response,
    }
}
