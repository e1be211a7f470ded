//! Raw statement access to the stores a maintenance task works on.
//!
//! A maintenance phase needs nothing beyond "run this statement on one
//! connection and give me the rows back". [`RawSession`] is that contract;
//! it is implemented for a bare [`SqliteConnection`] (the primary, file-based
//! stores) and for a pooled connection. [`DataContext`] is how a secondary
//! store, typically owned by another layer, hands out such a session.

use std::fmt;

use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, Row, Sqlite, SqliteConnection, SqlitePool, ValueRef};

use crate::Result;

/// SQLite's default: no sampling limit
const RESET_ANALYSIS_LIMIT: &str = "PRAGMA analysis_limit = 0";

/// Storage engine family behind a [`DataContext`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEngine {
   Sqlite,
   /// Any other engine, by provider name. Maintenance skips these.
   Other(String),
}

impl fmt::Display for StorageEngine {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         StorageEngine::Sqlite => f.write_str("sqlite"),
         StorageEngine::Other(name) => f.write_str(name),
      }
   }
}

/// A single connection that runs raw statements in order.
pub trait RawSession: Send {
   /// Runs `sql` and returns the first column of every row, as text.
   fn execute_raw<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<Vec<Option<String>>>>;

   /// Ends the session, closing or returning the connection.
   fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}

/// A store reached through another layer's connection management.
pub trait DataContext: Send + Sync {
   /// Identifies the store in logs and reports
   fn name(&self) -> &str;

   fn engine(&self) -> StorageEngine;

   /// Opens a session; every statement of a phase runs on it.
   fn session(&self) -> BoxFuture<'_, Result<Box<dyn RawSession>>>;
}

impl RawSession for SqliteConnection {
   fn execute_raw<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<Vec<Option<String>>>> {
      Box::pin(async move {
         let rows = sqlx::query(sql).fetch_all(&mut *self).await?;
         Ok(rows.iter().map(first_column_text).collect())
      })
   }

   fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
      Box::pin(async move {
         Connection::close(*self).await?;
         Ok(())
      })
   }
}

impl RawSession for PoolConnection<Sqlite> {
   fn execute_raw<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<Vec<Option<String>>>> {
      Box::pin(async move {
         let rows = sqlx::query(sql).fetch_all(&mut **self).await?;
         Ok(rows.iter().map(first_column_text).collect())
      })
   }

   /// Restores the default `analysis_limit` before the connection goes back to
   /// its pool. If that fails the connection is detached and closed instead.
   fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
      Box::pin(async move {
         let mut conn = *self;
         match sqlx::query(RESET_ANALYSIS_LIMIT).execute(&mut *conn).await {
            Ok(_) => Ok(()),
            Err(e) => {
               drop(conn.detach());
               Err(e.into())
            }
         }
      })
   }
}

/// [`DataContext`] over a shared sqlx pool.
///
/// Each session holds one pooled connection for the whole phase, so
/// connection-scoped settings such as `analysis_limit` carry over to the
/// statements that follow them.
#[derive(Debug, Clone)]
pub struct PoolContext {
   name: String,
   pool: SqlitePool,
}

impl PoolContext {
   pub fn new(name: impl Into<String>, pool: SqlitePool) -> Self {
      Self {
         name: name.into(),
         pool,
      }
   }

   pub fn pool(&self) -> &SqlitePool {
      &self.pool
   }
}

impl DataContext for PoolContext {
   fn name(&self) -> &str {
      &self.name
   }

   fn engine(&self) -> StorageEngine {
      StorageEngine::Sqlite
   }

   fn session(&self) -> BoxFuture<'_, Result<Box<dyn RawSession>>> {
      Box::pin(async move {
         let conn = self.pool.acquire().await?;
         Ok(Box::new(conn) as Box<dyn RawSession>)
      })
   }
}

/// Reads column 0 as text; integers and reals are converted by SQLite.
fn first_column_text(row: &SqliteRow) -> Option<String> {
   if row.is_empty() {
      return None;
   }

   match row.try_get_raw(0) {
      Ok(value) if !value.is_null() => row.try_get_unchecked::<String, _>(0).ok(),
      _ => None,
   }
}
