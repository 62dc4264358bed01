use crate::config::Settings;
use crate::services::identity::ConfiguredIdentity;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store_pool: Pool<SqliteConnectionManager>,
    pub settings: Arc<Settings>,
    /// Default-handler information reported by the diagnostics endpoint
    pub identity: ConfiguredIdentity,
}
