//! Implements a SQLite backed store.
//!
//! Each collection is a table with one column per document field. Statements
//! are built from the field names of the documents, which always come from
//! the app's own record types, and every value is passed as a parameter.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{
    Connection, Row, params_from_iter,
    types::{Value as SqlValue, ValueRef},
};
use serde_json::{Number, Value};

use crate::{
    Error,
    category::create_category_table,
    store::{Document, Filter, ID_FIELD, Query, RecordId, SortOrder, Store},
    transaction::create_transaction_table,
};

/// Stores documents in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    /// Open the database at `path`, or an in-memory database if `path` is
    /// `:memory:`.
    ///
    /// # Errors
    /// Returns an [Error::Storage] if the database cannot be opened.
    pub fn open(path: &str) -> Result<Self, Error> {
        let connection = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };

        Ok(Self::new(connection))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

/// Create the tables for the domain models if they do not exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

impl Store for SQLiteStore {
    async fn ensure_collections(&self) -> Result<(), Error> {
        let connection = self.lock()?;

        initialize(&connection)
    }

    async fn insert(
        &self,
        collection: &'static str,
        document: Document,
    ) -> Result<Document, Error> {
        let columns = document
            .keys()
            .map(|column| quote(column))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=document.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders}) RETURNING *",
            quote(collection)
        );
        let values = document.values().map(to_sql_value).collect::<Vec<_>>();

        let connection = self.lock()?;
        let mut statement = connection.prepare(&sql)?;
        let columns = column_names(&statement);

        statement
            .query_row(params_from_iter(values), |row| map_row(row, &columns))
            .map_err(Error::from)
    }

    async fn fetch_all(
        &self,
        collection: &'static str,
        query: &Query,
    ) -> Result<Vec<Document>, Error> {
        let mut sql = format!("SELECT * FROM {}", quote(collection));
        let mut values = Vec::new();

        if let Some(filter) = &query.filter {
            sql.push_str(&format!(" WHERE {} = ?1", quote(filter.field)));
            values.push(SqlValue::Text(filter.value.clone()));
        }

        match &query.sort {
            Some(sort) => {
                let direction = match sort.order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                sql.push_str(&format!(
                    " ORDER BY {} {direction}, rowid ASC",
                    quote(sort.field)
                ));
            }
            None => sql.push_str(" ORDER BY rowid ASC"),
        }

        let connection = self.lock()?;
        let mut statement = connection.prepare(&sql)?;
        let columns = column_names(&statement);

        let documents = statement
            .query_map(params_from_iter(values), |row| map_row(row, &columns))?
            .map(|maybe_document| maybe_document.map_err(Error::from))
            .collect();

        documents
    }

    async fn update(
        &self,
        collection: &'static str,
        id: &RecordId,
        changes: Document,
    ) -> Result<Document, Error> {
        let connection = self.lock()?;

        if changes.is_empty() {
            let sql = format!(
                "SELECT * FROM {} WHERE {} = ?1",
                quote(collection),
                quote(ID_FIELD)
            );
            let mut statement = connection.prepare(&sql)?;
            let columns = column_names(&statement);

            return statement
                .query_row([id.as_str()], |row| map_row(row, &columns))
                .map_err(Error::from);
        }

        let assignments = changes
            .keys()
            .enumerate()
            .map(|(index, column)| format!("{} = ?{}", quote(column), index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?{} RETURNING *",
            quote(collection),
            quote(ID_FIELD),
            changes.len() + 1
        );
        let mut values = changes.values().map(to_sql_value).collect::<Vec<_>>();
        values.push(SqlValue::Text(id.to_string()));

        let mut statement = connection.prepare(&sql)?;
        let columns = column_names(&statement);

        statement
            .query_row(params_from_iter(values), |row| map_row(row, &columns))
            .map_err(Error::from)
    }

    async fn delete(&self, collection: &'static str, id: &RecordId) -> Result<(), Error> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(collection),
            quote(ID_FIELD)
        );

        let rows_affected = self.lock()?.execute(&sql, [id.as_str()])?;

        if rows_affected == 0 {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }

    async fn delete_where(
        &self,
        collection: &'static str,
        filter: &Filter,
    ) -> Result<usize, Error> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(collection),
            quote(filter.field)
        );

        self.lock()?
            .execute(&sql, [filter.value.as_str()])
            .map_err(Error::from)
    }

    async fn close(self) -> Result<(), Error> {
        // Other clones may still be alive (e.g., in a test), in which case
        // the connection is closed when the last one is dropped.
        match Arc::try_unwrap(self.connection) {
            Ok(mutex) => {
                let connection = mutex.into_inner().map_err(|_| Error::DatabaseLockError)?;
                connection
                    .close()
                    .map_err(|(_, error)| Error::from(error))
            }
            Err(_) => Ok(()),
        }
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn column_names(statement: &rusqlite::Statement<'_>) -> Vec<String> {
    statement
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        // Nested values are not used by the app's records, store them as JSON text.
        other => SqlValue::Text(other.to_string()),
    }
}

fn map_row(row: &Row, columns: &[String]) -> Result<Document, rusqlite::Error> {
    let mut document = Document::new();

    for (index, column) in columns.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(integer) => Value::from(integer),
            ValueRef::Real(real) => Number::from_f64(real).map_or(Value::Null, Value::Number),
            ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
            ValueRef::Blob(_) => Value::Null,
        };

        document.insert(column.clone(), value);
    }

    Ok(document)
}
