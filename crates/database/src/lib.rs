//! # keystone-database
//!
//! A small storage connection contract with a SQLite backend.
//!
//! - `query` runs statements and reports the inserted row id and changes
//! - `select` and `first` return rows of [`DatabaseValue`]s with typed access
//! - `transaction` wraps a handler in `BEGIN TRANSACTION` / `COMMIT` and
//!   rolls back when the handler fails
//! - [`DatabaseProvider`] plugs a connection into a keystone container
//!
//! ```rust
//! use keystone_database::{Connection, SqliteConnection};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let conn = SqliteConnection::in_memory().await.unwrap();
//! conn.query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])
//!     .await
//!     .unwrap();
//!
//! let inserted = conn
//!     .query("INSERT INTO users (name) VALUES (?)", &["ada".into()])
//!     .await
//!     .unwrap();
//! assert_eq!(inserted.insert_id, Some(1));
//!
//! let row = conn.first("SELECT name FROM users", &[]).await.unwrap();
//! assert_eq!(row.get::<String>("name").unwrap(), "ada");
//! # });
//! ```

pub mod backends;
pub mod config;
pub mod connection;
pub mod error;
pub mod provider;
pub mod value;

pub use backends::SqliteConnection;
pub use config::DatabaseConfig;
pub use connection::{Connection, ConnectionExt};
pub use error::{DatabaseError, DatabaseResult};
pub use provider::{DatabaseProvider, DEFAULT_CONNECTION_NAME};
pub use value::{DatabaseValue, QueryResult, Row};
