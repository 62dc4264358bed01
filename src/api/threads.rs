use super::with_store;
use crate::models::ResolveResponse;
use crate::services::resolver::resolve_thread;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    // The address may arrive with + encoded as %2B
    let address = urlencoding::decode(&address)
        .unwrap_or(std::borrow::Cow::Borrowed(&address))
        .to_string();
    let tail_digits = state.settings.tail_digits;

    let lookup_address = address.clone();
    let result = with_store(&state, move |store| {
        resolve_thread(store, &lookup_address, tail_digits)
    })
    .await;

    match result {
        Ok(thread_id) => (
            StatusCode::OK,
            Json(ResolveResponse { address, thread_id }),
        )
            .into_response(),
        Err(response) => response,
    }
}
