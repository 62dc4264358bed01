//! In-memory record store used by unit tests. Seeded with rows per table,
//! it can inject failures, hide tables, ignore selections on the part table or reject
//! per-message part URIs, and records every query it receives.

use super::{Cursor, PartBlob, Predicate, RecordStore, Row, SortOrder, StoreError, Table};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

type FailRule = Box<dyn Fn(&Table, Option<&Predicate>) -> bool>;

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedQuery {
    pub table: Table,
    pub predicate: Option<Predicate>,
}

#[derive(Default)]
pub struct MemoryStore {
    sms: Vec<Row>,
    mms: Vec<Row>,
    addr: Vec<Row>,
    parts: Vec<Row>,
    threads: HashMap<String, i64>,
    blobs: HashMap<String, PartBlob>,
    fail_rules: Vec<FailRule>,
    missing_tables: Vec<Table>,
    fail_thread_lookup: bool,
    ignore_part_selection: bool,
    reject_direct_part_uri: bool,
    log: RefCell<Vec<LoggedQuery>>,
    thread_lookups: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sms(mut self, id: i64, thread_id: i64, address: &str, date: i64) -> Self {
        self.sms.push(
            Row::new()
                .with("_id", id)
                .with("thread_id", thread_id)
                .with("address", address)
                .with("date", date),
        );
        self
    }

    pub fn mms(mut self, id: i64, thread_id: i64, date_seconds: i64, msg_box: i64) -> Self {
        self.mms.push(
            Row::new()
                .with("_id", id)
                .with("thread_id", thread_id)
                .with("date", date_seconds)
                .with("msg_box", msg_box),
        );
        self
    }

    pub fn addr(mut self, msg_id: i64, address: &str) -> Self {
        self.addr
            .push(Row::new().with("msg_id", msg_id).with("address", address));
        self
    }

    pub fn part(mut self, id: i64, mid: i64, ct: Option<&str>, data: Option<&str>) -> Self {
        self.parts.push(
            Row::new()
                .with("_id", id)
                .with("mid", mid)
                .with("ct", ct)
                .with("_data", data),
        );
        self
    }

    pub fn raw_part(mut self, row: Row) -> Self {
        self.parts.push(row);
        self
    }

    pub fn thread(mut self, address: &str, thread_id: i64) -> Self {
        self.threads.insert(address.to_string(), thread_id);
        self
    }

    pub fn blob(mut self, part_id: &str, bytes: &[u8], mime_type: Option<&str>) -> Self {
        self.blobs.insert(
            part_id.to_string(),
            PartBlob {
                bytes: bytes.to_vec(),
                mime_type: mime_type.map(str::to_string),
            },
        );
        self
    }

    pub fn fail_when(
        mut self,
        rule: impl Fn(&Table, Option<&Predicate>) -> bool + 'static,
    ) -> Self {
        self.fail_rules.push(Box::new(rule));
        self
    }

    /// Answers every query on `table` with no cursor.
    pub fn missing_table(mut self, table: Table) -> Self {
        self.missing_tables.push(table);
        self
    }

    pub fn fail_thread_lookup(mut self) -> Self {
        self.fail_thread_lookup = true;
        self
    }

    /// Answers selections on the part table with an empty cursor.
    pub fn ignore_part_selection(mut self) -> Self {
        self.ignore_part_selection = true;
        self
    }

    /// Answers `content://mms/<id>/part` with no cursor.
    pub fn reject_direct_part_uri(mut self) -> Self {
        self.reject_direct_part_uri = true;
        self
    }

    pub fn queries(&self) -> Vec<LoggedQuery> {
        self.log.borrow().clone()
    }

    pub fn thread_lookups(&self) -> usize {
        self.thread_lookups.get()
    }
}

fn compare(a: &Row, b: &Row, column: &str) -> std::cmp::Ordering {
    match (a.get_i64(column), b.get_i64(column)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.get_str(column).cmp(&b.get_str(column)),
    }
}

impl RecordStore for MemoryStore {
    fn query(
        &self,
        table: &Table,
        columns: &[&str],
        predicate: Option<&Predicate>,
        order: Option<&SortOrder>,
    ) -> Result<Option<Cursor>, StoreError> {
        self.log.borrow_mut().push(LoggedQuery {
            table: table.clone(),
            predicate: predicate.cloned(),
        });

        if self.fail_rules.iter().any(|rule| rule(table, predicate)) {
            return Err(StoreError::Query(format!("injected failure on {}", table)));
        }
        if self.missing_tables.contains(table) {
            return Ok(None);
        }

        let mut rows: Vec<Row> = match table {
            Table::Sms => self.sms.clone(),
            Table::Mms => self.mms.clone(),
            Table::MmsAddr => self.addr.clone(),
            Table::MmsPart => {
                if self.ignore_part_selection && predicate.is_some() {
                    return Ok(Some(Cursor::default()));
                }
                self.parts.clone()
            }
            Table::PartsOfMessage(id) => {
                if self.reject_direct_part_uri {
                    return Ok(None);
                }
                self.parts
                    .iter()
                    .filter(|row| row.get_str("mid").as_deref() == Some(id.as_str()))
                    .cloned()
                    .collect()
            }
        };

        if let Some(predicate) = predicate {
            rows.retain(|row| predicate.matches(row));
        }
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare(a, b, order.column);
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let rows: Vec<Row> = rows.into_iter().map(|row| row.project(columns)).collect();
        Ok(Some(Cursor::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows,
        )))
    }

    fn get_or_create_thread_id(&self, address: &str) -> Result<i64, StoreError> {
        self.thread_lookups.set(self.thread_lookups.get() + 1);
        if self.fail_thread_lookup {
            return Err(StoreError::Unavailable("thread lookup disabled".to_string()));
        }
        Ok(self.threads.get(address).copied().unwrap_or(0))
    }

    fn open_part(&self, part_id: &str) -> Result<Option<PartBlob>, StoreError> {
        Ok(self.blobs.get(part_id).cloned())
    }
}
