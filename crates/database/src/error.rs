//! Error types for storage connections

use thiserror::Error;

/// Result type alias for connection operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error types for connection operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// `first` matched no row
    #[error("Row not found")]
    RowNotFound,

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The connection was used after `close`
    #[error("Connection is closed")]
    Closed,
}

impl DatabaseError {
    pub fn is_row_not_found(&self) -> bool {
        matches!(self, DatabaseError::RowNotFound)
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::RowNotFound,
            sqlx::Error::ColumnNotFound(column) => DatabaseError::ColumnNotFound(column),
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_) => DatabaseError::Connection(err.to_string()),
            sqlx::Error::PoolClosed => DatabaseError::Closed,
            other => DatabaseError::Query(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_error_mapping() {
        assert!(DatabaseError::from(sqlx::Error::RowNotFound).is_row_not_found());
        assert!(matches!(
            DatabaseError::from(sqlx::Error::ColumnNotFound("email".to_string())),
            DatabaseError::ColumnNotFound(ref column) if column == "email"
        ));
        assert!(matches!(
            DatabaseError::from(sqlx::Error::PoolClosed),
            DatabaseError::Closed
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(DatabaseError::RowNotFound.to_string(), "Row not found");
        assert_eq!(
            DatabaseError::Transaction("Failed to commit transaction: busy".to_string()).to_string(),
            "Transaction error: Failed to commit transaction: busy"
        );
    }
}
