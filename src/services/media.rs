use super::parts::extract_parts;
use super::resolver::resolve_thread;
use super::scanner::scan_messages;
use super::EngineOptions;
use crate::models::CompositeMessage;
use crate::store::RecordStore;
use tracing::info;

#[derive(Debug, PartialEq, Eq)]
pub enum MediaError {
    InvalidAddress,
}

impl MediaError {
    pub fn code(&self) -> &'static str {
        match self {
            MediaError::InvalidAddress => "E_INVALID_ADDRESS",
        }
    }
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::InvalidAddress => write!(f, "Address is required"),
        }
    }
}

impl std::error::Error for MediaError {}

/// Image and audio attachments exchanged with `address` between `from_ms`
/// and `to_ms`, grouped per message and oldest first. Messages without any
/// media part are left out; an unknown address gives an empty list.
pub fn get_mms_media(
    store: &dyn RecordStore,
    address: &str,
    from_ms: i64,
    to_ms: i64,
    options: &EngineOptions,
) -> Result<Vec<CompositeMessage>, MediaError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(MediaError::InvalidAddress);
    }

    info!(target: "media", address, from_ms, to_ms, "Collecting MMS media");

    let Some(thread_id) = resolve_thread(store, address, options.tail_digits) else {
        return Ok(Vec::new());
    };

    let messages = scan_messages(store, thread_id, from_ms, to_ms, options.inbound_box)
        .into_iter()
        .filter_map(|mut message| {
            message.parts = extract_parts(store, &message.mms_id);
            if message.parts.is_empty() {
                None
            } else {
                Some(message)
            }
        })
        .collect::<Vec<_>>();

    info!(
        target: "media",
        address,
        thread_id,
        messages = messages.len(),
        "Collected MMS media"
    );
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, ThreadId};
    use crate::store::memory::MemoryStore;
    use crate::store::sqlite::{SqliteStore, TEST_SCHEMA};
    use crate::store::{Predicate, Table};
    use rusqlite::Connection;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .sms(1, 4, "+33612345678", 1_700_000_000_000)
            .mms(20, 4, 1_700_000_100, 1)
            .mms(21, 4, 1_700_000_200, 2)
            .mms(22, 4, 1_700_000_300, 2)
            .mms(23, 9, 1_700_000_150, 1)
            .part(1, 20, Some("image/jpeg"), None)
            .part(2, 20, Some("text/plain"), None)
            .part(3, 21, Some("text/plain"), None)
            .part(4, 22, Some("application/octet-stream"), Some("/data/VOICE.amr"))
            .part(5, 23, Some("image/png"), None)
    }

    #[test]
    fn returns_media_messages_of_the_resolved_thread() {
        let result = get_mms_media(
            &store(),
            "+33 6 12 34 56 78",
            1_700_000_000_000,
            1_700_000_400_000,
            &EngineOptions::default(),
        )
        .unwrap();

        let ids: Vec<&str> = result.iter().map(|m| m.mms_id.as_str()).collect();
        assert_eq!(ids, vec!["20", "22"]);
        assert_eq!(result[0].direction, Direction::Received);
        assert_eq!(result[0].timestamp, 1_700_000_100_000);
        assert_eq!(result[0].parts.len(), 1);
        assert_eq!(result[1].direction, Direction::Sent);
        assert_eq!(result[1].parts[0].part_id, "4");
        assert!(result.iter().all(|m| m.thread_id == 4));
    }

    #[test]
    fn all_text_message_is_dropped() {
        let result = get_mms_media(
            &store(),
            "+33612345678",
            1_700_000_200_000,
            1_700_000_200_000,
            &EngineOptions::default(),
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn unknown_address_is_empty_not_an_error() {
        let result = get_mms_media(
            &store(),
            "+1 202 555 0199",
            0,
            i64::MAX,
            &EngineOptions::default(),
        );
        assert_eq!(result, Ok(Vec::new()));
    }

    #[test]
    fn blank_address_is_rejected() {
        let result = get_mms_media(&store(), "  ", 0, i64::MAX, &EngineOptions::default());
        assert_eq!(result, Err(MediaError::InvalidAddress));
        assert_eq!(MediaError::InvalidAddress.code(), "E_INVALID_ADDRESS");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_before_resolving() {
        let store = store().fail_when(|_, predicate| {
            matches!(predicate, Some(Predicate::EndsWith(..)))
        });
        let result = get_mms_media(
            &store,
            " +33612345678 ",
            1_700_000_000_000,
            1_700_000_400_000,
            &EngineOptions::default(),
        )
        .unwrap();

        assert_eq!(result.len(), 2);
        assert!(store.queries().iter().any(|q| q.table == Table::Sms
            && q.predicate == Some(Predicate::eq("address", "+33612345678"))));
    }

    fn sqlite_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(TEST_SCHEMA).unwrap();
        conn.execute_batch(
            "
            INSERT INTO sms (_id, thread_id, address, date) VALUES
                (1, 4, '+33612345678', 1700000000000),
                (2, 6, '5551234567', 1700000000000);
            INSERT INTO pdu (_id, thread_id, date, msg_box) VALUES
                (20, 4, 1700000100, 1),
                (21, 4, 1700000200, 2),
                (30, 6, 1700000300, 2),
                (40, 7, 1700000400, 1);
            INSERT INTO addr (msg_id, address, type) VALUES (40, '+447700900123', 137);
            INSERT INTO part (_id, mid, ct, _data, text) VALUES
                (1, 20, 'image/jpeg', '/data/IMG_1.jpg', NULL),
                (2, 20, 'text/plain', NULL, 'hi'),
                (3, 21, 'text/plain', NULL, 'only text'),
                (4, 30, 'application/octet-stream', '/data/VOICE.AMR', NULL),
                (5, 40, 'audio/amr', NULL, NULL);
            ",
        )
        .unwrap();
        conn
    }

    fn media_over_sqlite(conn: &Connection, address: &str) -> Vec<(String, ThreadId, usize)> {
        let store = SqliteStore::new(conn);
        get_mms_media(&store, address, 0, i64::MAX, &EngineOptions::default())
            .unwrap()
            .into_iter()
            .map(|m| (m.mms_id, m.thread_id, m.parts.len()))
            .collect()
    }

    #[test]
    fn pipeline_runs_against_sqlite_store() {
        let conn = sqlite_store();

        // exact match in the SMS log
        assert_eq!(
            media_over_sqlite(&conn, "+33612345678"),
            vec![("20".to_string(), 4, 1)]
        );
        // tail match in the SMS log
        assert_eq!(
            media_over_sqlite(&conn, "+1 (555) 123-4567"),
            vec![("30".to_string(), 6, 1)]
        );
        // MMS address table, then a hop to the message's thread
        assert_eq!(
            media_over_sqlite(&conn, "+44 7700 900123"),
            vec![("40".to_string(), 7, 1)]
        );
        assert!(media_over_sqlite(&conn, "+1 202 555 0199").is_empty());
    }
}
