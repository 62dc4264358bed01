pub mod debug;
pub mod media;
pub mod threads;

use crate::state::AppState;
use crate::store::sqlite::SqliteStore;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

pub(crate) fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": message,
            "code": code,
        })),
    )
        .into_response()
}

/// Runs blocking store work on a pooled connection off the async runtime.
pub(crate) async fn with_store<T, F>(state: &AppState, work: F) -> Result<T, Response>
where
    F: FnOnce(&SqliteStore<'_>) -> T + Send + 'static,
    T: Send + 'static,
{
    let pool = state.store_pool.clone();
    let allow_thread_create = state.settings.allow_thread_create;

    let result = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let store = SqliteStore::new(&conn).with_thread_creation(allow_thread_create);
        Ok::<T, StoreError>(work(&store))
    })
    .await;

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(target: "server", "Failed to open message store: {}", e);
            Err(error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "E_STORE",
                e.to_string(),
            ))
        }
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "E_INTERNAL",
            format!("Store task failed: {}", e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::services::identity::ConfiguredIdentity;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;
    use rusqlite::OpenFlags;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn unreachable_database_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("missing").join("mmssms.db");
        let manager = SqliteConnectionManager::file(&db_path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY);
        let store_pool = Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_millis(200))
            .build_unchecked(manager);

        let state = AppState {
            store_pool,
            settings: Arc::new(Settings {
                db_path,
                bind_addr: "127.0.0.1:0".to_string(),
                cache_dir: dir.path().to_path_buf(),
                pool_size: 1,
                inbound_box: 1,
                tail_digits: 8,
                allow_thread_create: false,
                package_name: None,
                default_sms_package: None,
            }),
            identity: ConfiguredIdentity::default(),
        };

        let response = with_store(&state, |_| ()).await.unwrap_err();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
