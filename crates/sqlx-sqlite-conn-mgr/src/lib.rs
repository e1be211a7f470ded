//! # sqlx-sqlite-conn-mgr
//!
//! A minimal wrapper around SQLx that enforces a single-writer connection
//! policy for an embedded SQLite file, with uniform pragma tuning.
//!
//! ## Core Types
//!
//! - **[`SqliteDatabase`]**: One database file, its persistent writer and the write gate
//! - **[`ConnectionHandle`]**: RAII handle over the writer or an owned reader
//! - **[`SqliteDatabaseConfig`]** / **[`PragmaConfig`]**: Tuning and write-gate policy
//! - **[`Error`]**: Error type for database operations
//!
//! ## Architecture
//!
//! - **Single persistent writer**: Opened on first write, reused until close
//! - **Exclusive writes**: An async mutex around the writer serializes write access
//! - **Owned readers**: Each read acquire opens its own read-only connection
//! - **Uniform tuning**: The same pragma statements, in a fixed order, on every connection
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_sqlite_conn_mgr::SqliteDatabase;
//!
//! #[tokio::main]
//! async fn main() -> sqlx_sqlite_conn_mgr::Result<()> {
//!    let db = SqliteDatabase::connect("example.db", None).await?;
//!
//!    // The first writer creates the file and switches it to WAL
//!    let mut writer = db.acquire_writer().await?;
//!    sqlx::query("CREATE TABLE IF NOT EXISTS users (name TEXT)")
//!       .execute(&mut *writer)
//!       .await?;
//!    writer.release().await?;
//!
//!    // Readers never wait on the writer
//!    let mut reader = db.acquire_reader().await?;
//!    let rows = sqlx::query("SELECT * FROM users")
//!       .fetch_all(&mut *reader)
//!       .await?;
//!    reader.release().await?;
//!
//!    db.close().await?;
//!    Ok(())
//! }
//! ```

mod config;
mod database;
mod error;
mod handle;

// Re-export public types
pub use config::{
   DEFAULT_JOURNAL_SIZE_LIMIT, DEFAULT_MMAP_SIZE, JournalMode, LockingMode, PragmaConfig,
   SqliteDatabaseConfig, Synchronous, TempStore,
};
pub use database::{ConnectionStats, SqliteDatabase};
pub use error::{Error, Result};
pub use handle::ConnectionHandle;
