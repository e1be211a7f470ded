//! Error types for sqlx-sqlite-conn-mgr

use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`SqliteDatabase`](crate::SqliteDatabase) and
/// [`ConnectionHandle`](crate::ConnectionHandle)
#[derive(Error, Debug)]
pub enum Error {
   /// Creating the parent directory or deleting store files failed
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Opening, tuning or closing a connection failed. Engine errors are
   /// passed through untranslated.
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// The store was closed; no further connections are handed out
   #[error("Database has been closed")]
   DatabaseClosed,

   /// The write gate was not granted within the configured `write_timeout`
   #[error("Timed out after {0:?} waiting for the write connection")]
   WriteTimeout(Duration),
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
