//! Attachment extraction for a single composite message.
//!
//! Providers differ in which selections they honor on the part table, so
//! parts are fetched through a chain of queries: a `mid` selection, then the
//! per-message part URI, then a full scan of the part table filtered here.
//! The first query that returns any row is used.

use super::classifier::is_media;
use super::degrade;
use crate::models::Attachment;
use crate::store::{part_uri, Predicate, RecordStore, Row, Table};
use tracing::{debug, info};

const PART_COLUMNS: [&str; 5] = ["_id", "mid", "ct", "_data", "text"];

type PartQuery = fn(&dyn RecordStore, &str) -> Option<Vec<Row>>;

const PART_QUERIES: [(&str, PartQuery); 3] = [
    ("selection", by_selection),
    ("direct_uri", by_direct_uri),
    ("full_scan", by_full_scan),
];

/// Media parts (image or audio) of a message. Text and other parts are
/// dropped; store failures yield an empty list.
pub fn extract_parts(store: &dyn RecordStore, message_id: &str) -> Vec<Attachment> {
    let Some((tier, rows)) = PART_QUERIES
        .iter()
        .find_map(|(tier, query)| query(store, message_id).map(|rows| (*tier, rows)))
    else {
        debug!(target: "parts", mms_id = message_id, "No parts found");
        return Vec::new();
    };

    let total = rows.len();
    let parts: Vec<Attachment> = rows.iter().filter_map(to_media_attachment).collect();
    debug!(
        target: "parts",
        mms_id = message_id,
        tier,
        rows = total,
        media = parts.len(),
        "Read parts"
    );
    parts
}

fn non_empty(rows: Vec<Row>) -> Option<Vec<Row>> {
    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}

fn by_selection(store: &dyn RecordStore, message_id: &str) -> Option<Vec<Row>> {
    let cursor = degrade(
        "part_selection",
        store.query(
            &Table::MmsPart,
            &PART_COLUMNS,
            Some(&Predicate::eq("mid", message_id)),
            None,
        ),
    )??;
    non_empty(cursor.into_rows())
}

fn by_direct_uri(store: &dyn RecordStore, message_id: &str) -> Option<Vec<Row>> {
    let cursor = degrade(
        "part_direct_uri",
        store.query(
            &Table::PartsOfMessage(message_id.to_string()),
            &PART_COLUMNS,
            None,
            None,
        ),
    )??;
    non_empty(cursor.into_rows())
}

fn by_full_scan(store: &dyn RecordStore, message_id: &str) -> Option<Vec<Row>> {
    info!(target: "parts", mms_id = message_id, "Falling back to full part scan");
    let cursor = degrade(
        "part_full_scan",
        store.query(&Table::MmsPart, &PART_COLUMNS, None, None),
    )??;

    let scanned = cursor.count();
    let matched: Vec<Row> = cursor
        .into_rows()
        .into_iter()
        .filter(|row| row.get_str("mid").as_deref() == Some(message_id))
        .collect();
    info!(
        target: "parts",
        mms_id = message_id,
        scanned,
        matched = matched.len(),
        "Full part scan done"
    );
    non_empty(matched)
}

fn to_media_attachment(row: &Row) -> Option<Attachment> {
    let mime_type = row.get_str("ct");
    let data = row.get_str("_data");
    if !is_media(mime_type.as_deref(), data.as_deref()) {
        return None;
    }
    let part_id = row.get_str("_id")?;
    Some(Attachment {
        uri: part_uri(&part_id),
        part_id,
        mime_type,
        data,
    })
}
