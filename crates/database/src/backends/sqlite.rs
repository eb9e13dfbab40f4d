//! SQLite backend built on sqlx

use crate::config::DatabaseConfig;
use crate::connection::{is_insert, Connection};
use crate::error::{DatabaseError, DatabaseResult};
use crate::value::{DatabaseValue, QueryResult, Row};
use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection as _, Row as _, TypeInfo, ValueRef};
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::debug;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A single SQLite connection
///
/// Statements are serialized through an async mutex, so the connection can
/// be shared between tasks behind an `Arc`. After `close` every statement
/// fails with [`DatabaseError::Closed`] until [`SqliteConnection::reopen`].
pub struct SqliteConnection {
    filename: String,
    options: SqliteConnectOptions,
    inner: Mutex<Option<sqlx::SqliteConnection>>,
}

impl SqliteConnection {
    /// Open the database described by `config`
    pub async fn connect(config: &DatabaseConfig) -> DatabaseResult<Self> {
        let options = if config.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.filename)
                .create_if_missing(config.create)
        };

        let connection = open(&config.filename, &options).await?;
        Ok(Self {
            filename: config.filename.clone(),
            options,
            inner: Mutex::new(Some(connection)),
        })
    }

    /// Open a private in-memory database
    pub async fn in_memory() -> DatabaseResult<Self> {
        Self::connect(&DatabaseConfig::memory()).await
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }

    /// Open the database again if the connection was closed
    ///
    /// An in-memory database comes back empty.
    pub async fn reopen(&self) -> DatabaseResult<()> {
        let mut guard = self.inner.lock().await;
        if guard.is_none() {
            *guard = Some(open(&self.filename, &self.options).await?);
        }
        Ok(())
    }
}

async fn open(filename: &str, options: &SqliteConnectOptions) -> DatabaseResult<sqlx::SqliteConnection> {
    let connection = options
        .connect()
        .await
        .map_err(|e| DatabaseError::Connection(format!("Failed to open '{}': {}", filename, e)))?;
    debug!(filename = filename, "SQLite connection opened");
    Ok(connection)
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("filename", &self.filename)
            .finish()
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn query(&self, sql: &str, params: &[DatabaseValue]) -> DatabaseResult<QueryResult> {
        let mut guard = self.inner.lock().await;
        let connection = guard.as_mut().ok_or(DatabaseError::Closed)?;

        debug!(sql = sql, params = params.len(), "Executing statement");
        let result = bind_values(sqlx::query(sql), params)
            .execute(&mut *connection)
            .await?;

        Ok(QueryResult {
            insert_id: is_insert(sql).then(|| result.last_insert_rowid()),
            changes: result.rows_affected(),
        })
    }

    async fn select(&self, sql: &str, params: &[DatabaseValue]) -> DatabaseResult<Vec<Row>> {
        let mut guard = self.inner.lock().await;
        let connection = guard.as_mut().ok_or(DatabaseError::Closed)?;

        debug!(sql = sql, params = params.len(), "Selecting rows");
        let rows = bind_values(sqlx::query(sql), params)
            .fetch_all(&mut *connection)
            .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn first(&self, sql: &str, params: &[DatabaseValue]) -> DatabaseResult<Row> {
        let mut guard = self.inner.lock().await;
        let connection = guard.as_mut().ok_or(DatabaseError::Closed)?;

        debug!(sql = sql, params = params.len(), "Selecting first row");
        let row = bind_values(sqlx::query(sql), params)
            .fetch_optional(&mut *connection)
            .await?;

        match row {
            Some(row) => decode_row(&row),
            None => Err(DatabaseError::RowNotFound),
        }
    }

    async fn close(&self) -> DatabaseResult<()> {
        let connection = self.inner.lock().await.take();
        if let Some(connection) = connection {
            connection.close().await?;
            debug!(filename = %self.filename, "SQLite connection closed");
        }
        Ok(())
    }
}

fn bind_values<'q>(mut query: SqliteQuery<'q>, params: &[DatabaseValue]) -> SqliteQuery<'q> {
    for value in params {
        query = match value {
            DatabaseValue::Null => query.bind(Option::<i64>::None),
            DatabaseValue::Integer(i) => query.bind(*i),
            DatabaseValue::Real(f) => query.bind(*f),
            DatabaseValue::Text(s) => query.bind(s.clone()),
            DatabaseValue::Blob(b) => query.bind(b.clone()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow) -> DatabaseResult<Row> {
    let mut columns = Vec::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        columns.push((column.name().to_string(), decode_value(row, index)?));
    }
    Ok(Row::new(columns))
}

/// Decode by the value's storage class rather than the declared column type
fn decode_value(row: &SqliteRow, index: usize) -> DatabaseResult<DatabaseValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let storage_class = raw.type_info().name().to_string();
    let value = match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => DatabaseValue::Integer(row.try_get(index)?),
        "REAL" => DatabaseValue::Real(row.try_get(index)?),
        "BLOB" => DatabaseValue::Blob(row.try_get(index)?),
        _ => DatabaseValue::Text(row.try_get(index)?),
    };
    Ok(value)
}
