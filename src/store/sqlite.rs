use super::{Cursor, PartBlob, Predicate, RecordStore, Row, SortOrder, StoreError, Table, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

/// Record store backed by an SMS/MMS provider database file
/// (`sms`, `pdu`, `addr`, `part`, `threads`, `canonical_addresses`).
pub struct SqliteStore<'a> {
    conn: &'a Connection,
    allow_thread_creation: bool,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            allow_thread_creation: false,
        }
    }

    /// Lets `get_or_create_thread_id` insert a thread for unknown
    /// addresses. Requires a writable connection.
    pub fn with_thread_creation(mut self, allow: bool) -> Self {
        self.allow_thread_creation = allow;
        self
    }

    fn table_columns(&self, table_name: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info(\"{}\")", table_name))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn select(
        &self,
        table: &Table,
        columns: &[&str],
        predicate: Option<&Predicate>,
        order: Option<&SortOrder>,
        limit: Option<usize>,
    ) -> Result<Option<Cursor>, StoreError> {
        let name = table_name(table);
        let available = self.table_columns(name)?;
        if available.is_empty() {
            debug!(target: "store", table = name, "Table not present");
            return Ok(None);
        }

        let scope = match table {
            Table::PartsOfMessage(id) => Some(Predicate::eq("mid", id.clone())),
            _ => None,
        };
        let clauses: Vec<&Predicate> = scope.iter().chain(predicate).collect();

        // Selections and orderings must name real columns. Unknown quoted
        // identifiers would otherwise be read as string literals.
        let mut referenced = Vec::new();
        for clause in &clauses {
            predicate_columns(clause, &mut referenced);
        }
        referenced.extend(order.map(|o| o.column));
        if let Some(missing) = referenced
            .iter()
            .find(|column| !available.iter().any(|a| a == *column))
        {
            return Err(StoreError::Query(format!(
                "no such column: {}.{}",
                name, missing
            )));
        }

        // Columns the table lacks are dropped from the projection rather
        // than failing the query.
        let projected: Vec<String> = if columns.is_empty() {
            available
        } else {
            columns
                .iter()
                .filter(|c| available.iter().any(|a| a == *c))
                .map(|c| c.to_string())
                .collect()
        };
        if projected.is_empty() {
            return Ok(Some(Cursor::default()));
        }

        let select_list = projected
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {} FROM \"{}\"", select_list, name);
        let mut args: Vec<SqlValue> = Vec::new();

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                compile_predicate(clause, &mut sql, &mut args);
            }
        }

        if let Some(order) = order {
            sql.push_str(&format!(
                " ORDER BY \"{}\" {}",
                order.column,
                if order.descending { "DESC" } else { "ASC" }
            ));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                let mut out = Row::new();
                for (i, column) in projected.iter().enumerate() {
                    out.insert(column, to_value(row.get_ref(i)?));
                }
                Ok(out)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Cursor::new(projected, rows)))
    }

    fn find_thread(&self, address: &str) -> Result<Option<i64>, StoreError> {
        let thread_id = self
            .conn
            .query_row(
                "SELECT t._id
                 FROM threads t
                 JOIN canonical_addresses ca ON t.recipient_ids = CAST(ca._id AS TEXT)
                 WHERE ca.address = ?1
                 ORDER BY t._id
                 LIMIT 1",
                params![address],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(thread_id)
    }

    fn create_thread(&self, address: &str) -> Result<i64, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT _id FROM canonical_addresses WHERE address = ?1",
                params![address],
                |row| row.get(0),
            )
            .optional()?;

        let recipient_id = match existing {
            Some(id) => id,
            None => {
                self.conn.execute(
                    "INSERT INTO canonical_addresses (address) VALUES (?1)",
                    params![address],
                )?;
                self.conn.last_insert_rowid()
            }
        };

        self.conn.execute(
            "INSERT INTO threads (date, message_count, recipient_ids) VALUES (?1, 0, ?2)",
            params![chrono::Utc::now().timestamp_millis(), recipient_id.to_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

fn table_name(table: &Table) -> &'static str {
    match table {
        Table::Sms => "sms",
        Table::Mms => "pdu",
        Table::MmsAddr => "addr",
        Table::MmsPart | Table::PartsOfMessage(_) => "part",
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn predicate_columns(predicate: &Predicate, out: &mut Vec<&'static str>) {
    match predicate {
        Predicate::Eq(column, _)
        | Predicate::EndsWith(column, _)
        | Predicate::AtLeast(column, _)
        | Predicate::AtMost(column, _) => out.push(*column),
        Predicate::And(all) => all.iter().for_each(|p| predicate_columns(p, out)),
    }
}

fn compile_predicate(predicate: &Predicate, sql: &mut String, args: &mut Vec<SqlValue>) {
    match predicate {
        Predicate::Eq(column, value) => {
            sql.push_str(&format!("\"{}\" = ?", column));
            args.push(SqlValue::Text(value.clone()));
        }
        Predicate::EndsWith(column, suffix) => {
            sql.push_str(&format!("\"{}\" LIKE ? ESCAPE '\\'", column));
            args.push(SqlValue::Text(format!("%{}", escape_like(suffix))));
        }
        Predicate::AtLeast(column, bound) => {
            sql.push_str(&format!("\"{}\" >= ?", column));
            args.push(SqlValue::Integer(*bound));
        }
        Predicate::AtMost(column, bound) => {
            sql.push_str(&format!("\"{}\" <= ?", column));
            args.push(SqlValue::Integer(*bound));
        }
        Predicate::And(all) => {
            if all.is_empty() {
                sql.push_str("1");
                return;
            }
            sql.push('(');
            for (i, p) in all.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                compile_predicate(p, sql, args);
            }
            sql.push(')');
        }
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        let home = std::env::var("HOME").unwrap_or_default();
        format!("{}{}", home, rest)
    } else {
        path.to_string()
    }
}

impl RecordStore for SqliteStore<'_> {
    fn query(
        &self,
        table: &Table,
        columns: &[&str],
        predicate: Option<&Predicate>,
        order: Option<&SortOrder>,
    ) -> Result<Option<Cursor>, StoreError> {
        self.select(table, columns, predicate, order, None)
    }

    fn query_head(
        &self,
        table: &Table,
        columns: &[&str],
        order: Option<&SortOrder>,
        limit: usize,
    ) -> Result<Option<Cursor>, StoreError> {
        self.select(table, columns, None, order, Some(limit))
    }

    fn count(&self, table: &Table) -> Result<Option<usize>, StoreError> {
        let name = table_name(table);
        if self.table_columns(name)?.is_empty() {
            return Ok(None);
        }
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", name),
            [],
            |row| row.get(0),
        )?;
        Ok(Some(count.max(0) as usize))
    }

    fn columns(&self, table: &Table) -> Result<Option<Vec<String>>, StoreError> {
        let available = self.table_columns(table_name(table))?;
        Ok(if available.is_empty() {
            None
        } else {
            Some(available)
        })
    }

    fn get_or_create_thread_id(&self, address: &str) -> Result<i64, StoreError> {
        if let Some(thread_id) = self.find_thread(address)? {
            return Ok(thread_id);
        }
        if !self.allow_thread_creation {
            return Ok(0);
        }
        self.create_thread(address)
    }

    fn open_part(&self, part_id: &str) -> Result<Option<PartBlob>, StoreError> {
        let row: Option<(Option<String>, Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT _data, ct, text FROM part WHERE _id = ?1",
                params![part_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((data, mime_type, text)) = row else {
            return Ok(None);
        };

        if let Some(path) = data {
            let expanded = expand_home(&path);
            if std::path::Path::new(&expanded).exists() {
                let bytes = std::fs::read(&expanded)?;
                return Ok(Some(PartBlob { bytes, mime_type }));
            }
            debug!(target: "store", part_id, path = expanded.as_str(), "Part file missing");
        }

        Ok(text.map(|text| PartBlob {
            bytes: text.into_bytes(),
            mime_type,
        }))
    }
}

#[cfg(test)]
pub(crate) const TEST_SCHEMA: &str = "
    CREATE TABLE sms (
        _id INTEGER PRIMARY KEY,
        thread_id INTEGER,
        address TEXT,
        date INTEGER,
        type INTEGER,
        body TEXT
    );
    CREATE TABLE pdu (
        _id INTEGER PRIMARY KEY,
        thread_id INTEGER,
        date INTEGER,
        msg_box INTEGER
    );
    CREATE TABLE addr (
        _id INTEGER PRIMARY KEY,
        msg_id INTEGER,
        address TEXT,
        type INTEGER
    );
    CREATE TABLE part (
        _id INTEGER PRIMARY KEY,
        mid INTEGER,
        ct TEXT,
        _data TEXT,
        text TEXT
    );
    CREATE TABLE canonical_addresses (
        _id INTEGER PRIMARY KEY AUTOINCREMENT,
        address TEXT
    );
    CREATE TABLE threads (
        _id INTEGER PRIMARY KEY AUTOINCREMENT,
        date INTEGER DEFAULT 0,
        message_count INTEGER DEFAULT 0,
        recipient_ids TEXT
    );
";
