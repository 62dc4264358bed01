use super::degrade;
use crate::models::{CompositeMessage, Direction, ThreadId};
use crate::store::{Predicate, RecordStore, SortOrder, Table};
use tracing::{debug, info};

const MMS_COLUMNS: [&str; 4] = ["_id", "date", "msg_box", "thread_id"];

/// Lists the composite messages of a thread whose date falls in
/// `[from_ms, to_ms]`, oldest first, with parts left empty.
///
/// The store keeps seconds, so both bounds are floored to the second before
/// querying. Store failures yield an empty list.
pub fn scan_messages(
    store: &dyn RecordStore,
    thread_id: ThreadId,
    from_ms: i64,
    to_ms: i64,
    inbound_box: i64,
) -> Vec<CompositeMessage> {
    if thread_id <= 0 {
        return Vec::new();
    }

    let from_seconds = from_ms.div_euclid(1000);
    let to_seconds = to_ms.div_euclid(1000);

    let selection = Predicate::And(vec![
        Predicate::eq("thread_id", thread_id.to_string()),
        Predicate::AtLeast("date", from_seconds),
        Predicate::AtMost("date", to_seconds),
    ]);

    let Some(Some(cursor)) = degrade(
        "mms_scan",
        store.query(
            &Table::Mms,
            &MMS_COLUMNS,
            Some(&selection),
            Some(&SortOrder::asc("date")),
        ),
    ) else {
        return Vec::new();
    };

    info!(target: "scanner", thread_id, rows = cursor.count(), "MMS rows found");

    let mut messages: Vec<CompositeMessage> = cursor
        .rows()
        .iter()
        .filter_map(|row| {
            let Some(mms_id) = row.get_str("_id") else {
                debug!(target: "scanner", "Skipping MMS row without id");
                return None;
            };
            let date_seconds = row.get_i64("date").unwrap_or(0);
            if date_seconds < from_seconds || date_seconds > to_seconds {
                return None;
            }
            if row.get_i64("thread_id").is_some_and(|t| t != thread_id) {
                return None;
            }
            Some(CompositeMessage {
                mms_id,
                thread_id,
                timestamp: date_seconds * 1000,
                direction: Direction::from_msg_box(
                    row.get_i64("msg_box").unwrap_or(0),
                    inbound_box,
                ),
                parts: Vec::new(),
            })
        })
        .collect();

    messages.sort_by_key(|m| m.timestamp);
    messages
}
