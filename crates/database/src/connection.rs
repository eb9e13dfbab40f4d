//! Connection contract shared by storage backends

use crate::error::{DatabaseError, DatabaseResult};
use crate::value::{DatabaseValue, QueryResult, Row};
use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{debug, warn};

/// A connection to a SQL store
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a statement. `insert_id` is filled in for `INSERT` statements only.
    async fn query(&self, sql: &str, params: &[DatabaseValue]) -> DatabaseResult<QueryResult>;

    /// Run a query and return every row
    async fn select(&self, sql: &str, params: &[DatabaseValue]) -> DatabaseResult<Vec<Row>>;

    /// Run a query and return the first row, or [`DatabaseError::RowNotFound`]
    async fn first(&self, sql: &str, params: &[DatabaseValue]) -> DatabaseResult<Row>;

    /// Close the connection
    async fn close(&self) -> DatabaseResult<()>;
}

/// Transactions on top of any [`Connection`]
#[async_trait]
pub trait ConnectionExt: Connection {
    /// Run `handler` between `BEGIN TRANSACTION` and `COMMIT`.
    ///
    /// When the handler fails the transaction is rolled back and the
    /// handler's error is returned. A failed rollback is reported instead.
    ///
    /// ```rust,no_run
    /// # use keystone_database::{Connection, ConnectionExt, DatabaseResult};
    /// # async fn transfer(conn: &dyn Connection) -> DatabaseResult<()> {
    /// conn.transaction(|conn| {
    ///     Box::pin(async move {
    ///         conn.query("UPDATE accounts SET balance = balance - 10 WHERE id = 1", &[]).await?;
    ///         conn.query("UPDATE accounts SET balance = balance + 10 WHERE id = 2", &[]).await?;
    ///         Ok(())
    ///     })
    /// })
    /// .await
    /// # }
    /// ```
    async fn transaction<T, F>(&self, handler: F) -> DatabaseResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c Self) -> BoxFuture<'c, DatabaseResult<T>> + Send;
}

#[async_trait]
impl<C> ConnectionExt for C
where
    C: Connection + ?Sized,
{
    async fn transaction<T, F>(&self, handler: F) -> DatabaseResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c Self) -> BoxFuture<'c, DatabaseResult<T>> + Send,
    {
        self.query("BEGIN TRANSACTION", &[])
            .await
            .map_err(|e| DatabaseError::Transaction(format!("Failed to begin transaction: {}", e)))?;
        debug!("Transaction started");

        match handler(self).await {
            Ok(result) => {
                self.query("COMMIT", &[]).await.map_err(|e| {
                    DatabaseError::Transaction(format!("Failed to commit transaction: {}", e))
                })?;
                debug!("Transaction committed");
                Ok(result)
            }
            Err(error) => {
                warn!("Transaction handler failed, rolling back: {}", error);
                self.query("ROLLBACK", &[]).await.map_err(|e| {
                    DatabaseError::Transaction(format!("Failed to rollback transaction: {}", e))
                })?;
                debug!("Transaction rolled back");
                Err(error)
            }
        }
    }
}

/// Whether `sql` is an `INSERT` statement
pub(crate) fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("insert"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records statements and fails the ones it is told to
    #[derive(Default)]
    struct ScriptedConnection {
        statements: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl ScriptedConnection {
        fn failing(statement: &'static str) -> Self {
            Self {
                fail_on: Some(statement),
                ..Self::default()
            }
        }

        fn statements(&self) -> Vec<String> {
            self.statements.lock().clone()
        }
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn query(&self, sql: &str, _params: &[DatabaseValue]) -> DatabaseResult<QueryResult> {
            self.statements.lock().push(sql.to_string());
            if self.fail_on == Some(sql) {
                return Err(DatabaseError::Query(format!("{} failed", sql)));
            }
            Ok(QueryResult::default())
        }

        async fn select(&self, _sql: &str, _params: &[DatabaseValue]) -> DatabaseResult<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn first(&self, _sql: &str, _params: &[DatabaseValue]) -> DatabaseResult<Row> {
            Err(DatabaseError::RowNotFound)
        }

        async fn close(&self) -> DatabaseResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_is_insert() {
        assert!(is_insert("INSERT INTO users VALUES (1)"));
        assert!(is_insert("  insert into users values (1)"));
        assert!(!is_insert("UPDATE users SET name = 'x'"));
        assert!(!is_insert("ins"));
    }

    #[tokio::test]
    async fn test_transaction_commits() {
        let conn = ScriptedConnection::default();

        let value = conn
            .transaction(|conn| {
                Box::pin(async move {
                    conn.query("UPDATE t SET x = 1", &[]).await?;
                    Ok(5)
                })
            })
            .await
            .unwrap();

        assert_eq!(value, 5);
        assert_eq!(
            conn.statements(),
            vec!["BEGIN TRANSACTION", "UPDATE t SET x = 1", "COMMIT"]
        );
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_and_returns_handler_error() {
        let conn = ScriptedConnection::default();

        let error = conn
            .transaction(|_conn| Box::pin(async move { Err::<(), _>(DatabaseError::RowNotFound) }))
            .await
            .unwrap_err();

        assert!(error.is_row_not_found());
        assert_eq!(conn.statements(), vec!["BEGIN TRANSACTION", "ROLLBACK"]);
    }

    #[tokio::test]
    async fn test_failed_commit_is_not_rolled_back() {
        let conn = ScriptedConnection::failing("COMMIT");

        let error = conn
            .transaction(|_conn| Box::pin(async move { Ok(()) }))
            .await
            .unwrap_err();

        assert!(matches!(error, DatabaseError::Transaction(_)));
        assert_eq!(conn.statements(), vec!["BEGIN TRANSACTION", "COMMIT"]);
    }

    #[tokio::test]
    async fn test_failed_rollback_replaces_handler_error() {
        let conn = ScriptedConnection::failing("ROLLBACK");

        let error = conn
            .transaction(|_conn| Box::pin(async move { Err::<(), _>(DatabaseError::RowNotFound) }))
            .await
            .unwrap_err();

        assert!(matches!(error, DatabaseError::Transaction(ref message) if message.contains("rollback")));
    }

    #[tokio::test]
    async fn test_failed_begin_skips_handler() {
        let conn = ScriptedConnection::failing("BEGIN TRANSACTION");

        let result = conn
            .transaction(|conn| {
                Box::pin(async move {
                    conn.query("UPDATE t SET x = 1", &[]).await?;
                    Ok(())
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(conn.statements(), vec!["BEGIN TRANSACTION"]);
    }

    #[tokio::test]
    async fn test_transaction_through_trait_object() {
        let conn = ScriptedConnection::default();
        let dynamic: &dyn Connection = &conn;

        dynamic
            .transaction(|conn| Box::pin(async move { conn.first("SELECT 1", &[]).await.map(|_| ()) }))
            .await
            .unwrap_err();

        assert_eq!(conn.statements(), vec!["BEGIN TRANSACTION", "ROLLBACK"]);
    }
}
