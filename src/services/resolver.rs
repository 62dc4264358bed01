//! Address to conversation resolution.
//!
//! Strategies are tried in a fixed order and the first positive thread id
//! wins: the store's own get-or-create primitive, an exact then a tail-digit
//! match against the SMS log, and finally the MMS address table, which maps
//! to a message id and needs a second hop to reach the thread. Exact
//! matches always run before tail matches because numbers that share a
//! suffix can collide.

use super::address::match_tail;
use super::degrade;
use crate::models::ThreadId;
use crate::store::{Cursor, Predicate, RecordStore, SortOrder, Table};
use tracing::{debug, info};

struct Lookup<'a> {
    store: &'a dyn RecordStore,
    address: &'a str,
    tail_digits: usize,
}

type Strategy = fn(&Lookup<'_>) -> Option<ThreadId>;
type MessageIdFinder = fn(&Lookup<'_>) -> Option<String>;

const STRATEGIES: [(&str, Strategy); 4] = [
    ("platform", from_platform),
    ("sms_exact", from_sms_exact),
    ("sms_tail", from_sms_tail),
    ("mms_addr", from_mms_addr),
];

const MESSAGE_ID_FINDERS: [(&str, MessageIdFinder); 2] = [
    ("mms_addr_exact", addr_exact),
    ("mms_addr_tail", addr_tail),
];

/// Resolves the conversation an address belongs to. Never fails: store
/// errors are logged and the next strategy runs.
pub fn resolve_thread(
    store: &dyn RecordStore,
    address: &str,
    tail_digits: usize,
) -> Option<ThreadId> {
    if address.trim().is_empty() {
        return None;
    }

    let lookup = Lookup {
        store,
        address,
        tail_digits,
    };

    for (tier, strategy) in STRATEGIES {
        if let Some(thread_id) = strategy(&lookup) {
            info!(target: "resolver", address, tier, thread_id, "Resolved thread");
            return Some(thread_id);
        }
        debug!(target: "resolver", address, tier, "Tier found no thread");
    }

    info!(target: "resolver", address, "No thread for address");
    None
}

fn first_thread_id(cursor: Option<Cursor>) -> Option<ThreadId> {
    cursor?.first()?.get_i64("thread_id").filter(|id| *id > 0)
}

fn first_message_id(cursor: Option<Cursor>) -> Option<String> {
    cursor?.first()?.get_str("msg_id")
}

fn from_platform(l: &Lookup<'_>) -> Option<ThreadId> {
    degrade("platform", l.store.get_or_create_thread_id(l.address)).filter(|id| *id > 0)
}

fn from_sms_exact(l: &Lookup<'_>) -> Option<ThreadId> {
    let cursor = degrade(
        "sms_exact",
        l.store.query(
            &Table::Sms,
            &["thread_id"],
            Some(&Predicate::eq("address", l.address)),
            Some(&SortOrder::desc("date")),
        ),
    )?;
    first_thread_id(cursor)
}

fn from_sms_tail(l: &Lookup<'_>) -> Option<ThreadId> {
    let tail = match_tail(l.address, l.tail_digits)?;
    let cursor = degrade(
        "sms_tail",
        l.store.query(
            &Table::Sms,
            &["thread_id", "address"],
            Some(&Predicate::ends_with("address", tail)),
            Some(&SortOrder::desc("date")),
        ),
    )?;
    first_thread_id(cursor)
}

fn from_mms_addr(l: &Lookup<'_>) -> Option<ThreadId> {
    let msg_id = MESSAGE_ID_FINDERS.iter().find_map(|(tier, finder)| {
        let found = finder(l);
        if let Some(ref id) = found {
            debug!(target: "resolver", tier, msg_id = id.as_str(), "Matched address row");
        }
        found
    })?;

    thread_of_message(l.store, &msg_id)
}

fn addr_exact(l: &Lookup<'_>) -> Option<String> {
    let cursor = degrade(
        "mms_addr_exact",
        l.store.query(
            &Table::MmsAddr,
            &["msg_id"],
            Some(&Predicate::eq("address", l.address)),
            Some(&SortOrder::desc("msg_id")),
        ),
    )?;
    first_message_id(cursor)
}

fn addr_tail(l: &Lookup<'_>) -> Option<String> {
    let tail = match_tail(l.address, l.tail_digits)?;
    let cursor = degrade(
        "mms_addr_tail",
        l.store.query(
            &Table::MmsAddr,
            &["msg_id", "address"],
            Some(&Predicate::ends_with("address", tail)),
            Some(&SortOrder::desc("msg_id")),
        ),
    )?;
    first_message_id(cursor)
}

fn thread_of_message(store: &dyn RecordStore, msg_id: &str) -> Option<ThreadId> {
    let cursor = degrade(
        "mms_thread",
        store.query(
            &Table::Mms,
            &["thread_id"],
            Some(&Predicate::eq("_id", msg_id)),
            None,
        ),
    )?;
    first_thread_id(cursor)
}
