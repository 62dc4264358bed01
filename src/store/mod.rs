//! Record store gateway.
//!
//! The message database is reached through a small tabular query contract:
//! a table locator, a projection, an optional predicate and an optional
//! ordering. A store answers with an owned [`Cursor`], or `None` when the
//! table is unavailable or the query is unsupported. Callers treat both
//! `None` and an empty cursor as "no rows".

#[cfg(test)]
pub mod memory;
pub mod sqlite;

use std::collections::HashMap;
use std::fmt;

/// Logical tables of the message store, rendered as provider URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Table {
    Sms,
    Mms,
    MmsAddr,
    MmsPart,
    /// Parts of a single composite message, addressed without a selection.
    PartsOfMessage(String),
}

impl Table {
    pub fn uri(&self) -> String {
        match self {
            Table::Sms => "content://sms".to_string(),
            Table::Mms => "content://mms".to_string(),
            Table::MmsAddr => "content://mms/addr".to_string(),
            Table::MmsPart => "content://mms/part".to_string(),
            Table::PartsOfMessage(id) => format!("content://mms/{}/part", id),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Addressable reference for a single part.
pub fn part_uri(part_id: &str) -> String {
    format!("content://mms/part/{}", part_id)
}

/// A single cell value as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One result row: column name to value. Columns the store did not return
/// are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<Value>) {
        self.values.insert(column.to_string(), value.into());
    }

    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Reads a column as text. Numbers are rendered the way a platform
    /// cursor would; `NULL` and missing columns read as `None`.
    pub fn get_str(&self, column: &str) -> Option<String> {
        match self.values.get(column)? {
            Value::Null => None,
            Value::Integer(n) => Some(n.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }

    /// Reads a column as an integer, parsing numeric text.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.values.get(column)? {
            Value::Null => None,
            Value::Integer(n) => Some(*n),
            Value::Real(r) => Some(*r as i64),
            Value::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Keeps only the requested columns. An empty projection keeps all.
    #[cfg(test)]
    pub fn project(mut self, columns: &[&str]) -> Self {
        if !columns.is_empty() {
            self.values.retain(|name, _| columns.contains(&name.as_str()));
        }
        self
    }
}

/// Materialized result set. Dropping it releases everything the query held.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Cursor {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn truncated(mut self, limit: usize) -> Self {
        self.rows.truncate(limit);
        self
    }
}

/// Boolean selection over column names. Equality arguments are passed as
/// text, the same way provider selection arguments are.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(&'static str, String),
    /// Suffix match (`LIKE '%suffix'`).
    EndsWith(&'static str, String),
    AtLeast(&'static str, i64),
    AtMost(&'static str, i64),
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Predicate::Eq(column, value.into())
    }

    pub fn ends_with(column: &'static str, suffix: impl Into<String>) -> Self {
        Predicate::EndsWith(column, suffix.into())
    }

    /// Evaluates the predicate in process.
    #[cfg(test)]
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Eq(column, value) => row.get_str(column).as_deref() == Some(value.as_str()),
            Predicate::EndsWith(column, suffix) => row
                .get_str(column)
                .map(|v| v.ends_with(suffix.as_str()))
                .unwrap_or(false),
            Predicate::AtLeast(column, bound) => {
                row.get_i64(column).map(|v| v >= *bound).unwrap_or(false)
            }
            Predicate::AtMost(column, bound) => {
                row.get_i64(column).map(|v| v <= *bound).unwrap_or(false)
            }
            Predicate::And(all) => all.iter().all(|p| p.matches(row)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub column: &'static str,
    pub descending: bool,
}

impl SortOrder {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Raw content of a part together with its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct PartBlob {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[derive(Debug)]
pub enum StoreError {
    /// The backing database could not be reached.
    Unavailable(String),
    /// The query was rejected or failed while running.
    Query(String),
    /// Reading part content from disk failed.
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "Query failed: {}", msg),
            StoreError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

pub trait RecordStore {
    fn query(
        &self,
        table: &Table,
        columns: &[&str],
        predicate: Option<&Predicate>,
        order: Option<&SortOrder>,
    ) -> Result<Option<Cursor>, StoreError>;

    /// Platform get-or-create primitive. Returns a value <= 0 when no
    /// thread exists and none could be created.
    fn get_or_create_thread_id(&self, address: &str) -> Result<i64, StoreError>;

    /// Opens the content of a part, `None` when the part or its backing
    /// file does not exist.
    fn open_part(&self, part_id: &str) -> Result<Option<PartBlob>, StoreError>;

    /// At most `limit` rows of an unfiltered query.
    fn query_head(
        &self,
        table: &Table,
        columns: &[&str],
        order: Option<&SortOrder>,
        limit: usize,
    ) -> Result<Option<Cursor>, StoreError> {
        Ok(self
            .query(table, columns, None, order)?
            .map(|cursor| cursor.truncated(limit)))
    }

    /// Row count, `None` when the table is unavailable.
    fn count(&self, table: &Table) -> Result<Option<usize>, StoreError> {
        Ok(self.query(table, &["_id"], None, None)?.map(|c| c.count()))
    }

    /// Column names the table exposes, `None` when it is unavailable.
    fn columns(&self, table: &Table) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self
            .query(table, &[], None, None)?
            .map(|c| c.column_names().to_vec()))
    }
}
