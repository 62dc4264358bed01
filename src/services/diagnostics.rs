use super::identity::PlatformIdentity;
use crate::models::{DebugReport, MmsDebugRow};
use crate::store::{RecordStore, StoreError, Table};
use tracing::{debug, info};

const DETAIL_LIMIT: usize = 20;

/// Snapshot of the message store used to diagnose devices where media
/// does not come back: MMS and part counts, the first MMS rows, the part
/// table's columns and whether this app is the default SMS handler.
pub fn debug_mms_database(
    store: &dyn RecordStore,
    identity: &dyn PlatformIdentity,
) -> Result<DebugReport, StoreError> {
    let total_mms_count = store.count(&Table::Mms)?.unwrap_or(0);
    info!(target: "debug", total_mms_count, "Counted MMS");

    let mms_details: Vec<MmsDebugRow> = store
        .query_head(
            &Table::Mms,
            &["_id", "thread_id", "date", "msg_box"],
            None,
            DETAIL_LIMIT,
        )?
        .map(|cursor| {
            cursor
                .rows()
                .iter()
                .map(|row| MmsDebugRow {
                    mms_id: row.get_str("_id"),
                    thread_id: row.get_i64("thread_id"),
                    date: row.get_i64("date"),
                    msg_box: row.get_i64("msg_box"),
                })
                .collect()
        })
        .unwrap_or_default();
    for row in &mms_details {
        debug!(
            target: "debug",
            mms_id = row.mms_id.as_deref(),
            thread_id = row.thread_id,
            date = row.date,
            "MMS row"
        );
    }

    let total_parts_count = store.count(&Table::MmsPart)?.unwrap_or(0);
    let parts_columns = store.columns(&Table::MmsPart)?.unwrap_or_default();
    info!(
        target: "debug",
        total_parts_count,
        columns = ?parts_columns,
        "Counted MMS parts"
    );

    let current_package = identity.package_name();
    let default_sms_package = identity.default_handler_package();
    let is_default_sms = identity.is_default_handler();
    info!(
        target: "debug",
        current_package = current_package.as_deref(),
        default_sms_package = default_sms_package.as_deref(),
        "Default handler check"
    );

    Ok(DebugReport {
        total_mms_count,
        mms_details,
        total_parts_count,
        parts_columns,
        current_package,
        default_sms_package,
        is_default_sms,
        generated_at: chrono::Utc::now().timestamp_millis(),
    })
}
