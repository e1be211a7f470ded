//! SQLite database with a single persistent writer and owned readers

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, trace, warn};

use crate::config::SqliteDatabaseConfig;
use crate::handle::{ConnectionHandle, WriterSlot};
use crate::{Error, Result};

/// Counters of physical connections opened by a [`SqliteDatabase`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
   /// Writer connections opened. Stays at 0 or 1 for the life of the database.
   pub writers_opened: u64,
   /// Read-only connections opened, one per reader acquire
   pub readers_opened: u64,
}

/// SQLite database with serialized writes and concurrent reads.
///
/// ## Architecture
///
/// - **`writer`**: Slot for the single read-write connection, guarded by an
///   async mutex that doubles as the write gate. The connection is opened on
///   the first write acquire and kept until [`close`](Self::close).
/// - **Readers**: Every read acquire opens a fresh read-only connection owned
///   by the caller. Readers never wait on the write gate.
/// - **`pragma_statements`**: Resolved once from the configuration and
///   applied, in order, to every connection opened, writer and readers alike.
///
/// ## State Management
///
/// - **`closed`**: Prevents use after the database has been closed
/// - **`path`**: Database file path, also used by [`remove`](Self::remove)
///
/// ## Usage Pattern
///
/// ```text
/// 1. Connect (records path and configuration, opens nothing)
/// 2. Read operations: acquire_reader() per unit of work, release when done
/// 3. Write operations: acquire_writer() waits for the gate; the first call
///    opens and tunes the writer
/// 4. Close database when done
/// ```
pub struct SqliteDatabase {
   /// Write gate and persistent writer connection
   writer: Arc<Mutex<WriterSlot>>,

   /// Pragma statements applied to each new physical connection
   pragma_statements: Vec<String>,

   config: SqliteDatabaseConfig,

   /// Marks database as closed to prevent further operations
   closed: AtomicBool,

   writers_opened: AtomicU64,
   readers_opened: AtomicU64,

   /// Path to database file
   path: PathBuf,
}

impl SqliteDatabase {
   /// Prepares a database at `path`.
   ///
   /// Missing parent directories are created. No connection is opened until
   /// the first acquire; the file itself is created by the first writer.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let path = path.as_ref().to_path_buf();

      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
         tokio::fs::create_dir_all(parent).await?;
      }

      let config = custom_config.unwrap_or_default();
      let pragma_statements = config.pragmas.statements();

      debug!(
         path = %path.display(),
         pragmas = ?pragma_statements,
         write_timeout = ?config.write_timeout,
         "Configured SQLite database"
      );

      Ok(Arc::new(Self {
         writer: Arc::new(Mutex::new(None)),
         pragma_statements,
         config,
         closed: AtomicBool::new(false),
         writers_opened: AtomicU64::new(0),
         readers_opened: AtomicU64::new(0),
         path,
      }))
   }

   /// Acquires the writer when `write` is true, otherwise a new reader.
   pub async fn acquire(&self, write: bool) -> Result<ConnectionHandle> {
      if write {
         self.acquire_writer().await
      } else {
         self.acquire_reader().await
      }
   }

   /// Waits for the write gate and returns a handle to the shared writer.
   ///
   /// The wait is unbounded unless `write_timeout` is configured. Holding a
   /// writer handle while calling [`close`](Self::close) from the same task
   /// deadlocks, since closing takes the gate too.
   pub async fn acquire_writer(&self) -> Result<ConnectionHandle> {
      self.ensure_open()?;

      let lock = Arc::clone(&self.writer).lock_owned();
      let mut slot = match self.config.write_timeout {
         Some(limit) => tokio::time::timeout(limit, lock)
            .await
            .map_err(|_| Error::WriteTimeout(limit))?,
         None => lock.await,
      };

      // The database may have been closed while we were queued
      self.ensure_open()?;

      if slot.is_none() {
         *slot = Some(self.open_writer().await?);
      }

      let guard = OwnedMutexGuard::try_map(slot, |slot| slot.as_mut())
         .map_err(|_| Error::DatabaseClosed)?;

      trace!(path = %self.path.display(), "Write gate acquired");
      Ok(ConnectionHandle::writer(guard))
   }

   /// Opens a new read-only connection owned by the caller.
   ///
   /// Readers open the file read-only, so the file must already exist. The
   /// journal mode is a property of the file that only the writer can
   /// switch: on a file not yet in WAL mode the reader's `journal_mode`
   /// statement is refused as read-only, and the reader keeps the file's
   /// current mode.
   pub async fn acquire_reader(&self) -> Result<ConnectionHandle> {
      self.ensure_open()?;

      let options = SqliteConnectOptions::new()
         .filename(&self.path)
         .read_only(true);

      let mut conn = SqliteConnection::connect_with(&options).await?;
      self.apply_pragmas(&mut conn, true).await?;
      self.readers_opened.fetch_add(1, Ordering::Relaxed);

      trace!(path = %self.path.display(), "Reader connection opened");
      Ok(ConnectionHandle::reader(conn))
   }

   /// Closes the writer connection and marks the database as closed.
   ///
   /// Waits for any current writer to release the gate first. Subsequent
   /// acquires fail with [`Error::DatabaseClosed`]; calling `close` again is
   /// a no-op.
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      let mut slot = self.writer.lock().await;
      if let Some(conn) = slot.take() {
         conn.close().await?;
      }

      debug!(path = %self.path.display(), "Closed SQLite database");
      Ok(())
   }

   /// Closes the database and deletes its file along with the `-wal` and
   /// `-shm` sidecar files.
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      for file in [
         self.path.clone(),
         sidecar_path(&self.path, "-wal"),
         sidecar_path(&self.path, "-shm"),
      ] {
         match tokio::fs::remove_file(&file).await {
            Ok(()) => trace!(file = %file.display(), "Removed database file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
         }
      }

      Ok(())
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   pub fn config(&self) -> &SqliteDatabaseConfig {
      &self.config
   }

   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   /// Snapshot of how many physical connections have been opened
   pub fn stats(&self) -> ConnectionStats {
      ConnectionStats {
         writers_opened: self.writers_opened.load(Ordering::Relaxed),
         readers_opened: self.readers_opened.load(Ordering::Relaxed),
      }
   }

   fn ensure_open(&self) -> Result<()> {
      if self.is_closed() {
         return Err(Error::DatabaseClosed);
      }
      Ok(())
   }

   async fn open_writer(&self) -> Result<SqliteConnection> {
      let options = SqliteConnectOptions::new()
         .filename(&self.path)
         .create_if_missing(true);

      let mut conn = SqliteConnection::connect_with(&options).await?;
      self.apply_pragmas(&mut conn, false).await?;
      self.writers_opened.fetch_add(1, Ordering::Relaxed);

      log_diagnostics(&mut conn, &self.path, &self.pragma_statements).await;
      Ok(conn)
   }

   async fn apply_pragmas(&self, conn: &mut SqliteConnection, read_only: bool) -> Result<()> {
      for statement in &self.pragma_statements {
         match sqlx::query(statement.as_str()).execute(&mut *conn).await {
            Ok(_) => {}
            Err(e) if read_only && is_journal_mode(statement) && is_readonly_error(&e) => {
               debug!(
                  path = %self.path.display(),
                  error = %e,
                  "Reader kept the file's journal mode"
               );
            }
            Err(e) => return Err(e.into()),
         }
      }
      Ok(())
   }
}

impl std::fmt::Debug for SqliteDatabase {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("SqliteDatabase")
         .field("path", &self.path)
         .field("config", &self.config)
         .field("closed", &self.is_closed())
         .field("stats", &self.stats())
         .finish_non_exhaustive()
   }
}

/// Logs engine version, compile options and the applied tuning.
///
/// Purely informational; failures are logged and ignored.
async fn log_diagnostics(conn: &mut SqliteConnection, path: &Path, pragmas: &[String]) {
   match sqlx::query_scalar::<_, String>("SELECT sqlite_version()")
      .fetch_one(&mut *conn)
      .await
   {
      Ok(version) => info!(path = %path.display(), version = %version, "Opened SQLite writer"),
      Err(e) => warn!(path = %path.display(), error = %e, "Failed to query SQLite version"),
   }

   match sqlx::query_scalar::<_, String>("PRAGMA compile_options")
      .fetch_all(&mut *conn)
      .await
   {
      Ok(options) => debug!(compile_options = ?options, "SQLite compile options"),
      Err(e) => warn!(error = %e, "Failed to query SQLite compile options"),
   }

   debug!(pragmas = ?pragmas, "Applied connection pragmas");
}

fn is_journal_mode(statement: &str) -> bool {
   statement.starts_with("PRAGMA journal_mode")
}

/// SQLITE_READONLY, including its extended codes
fn is_readonly_error(error: &sqlx::Error) -> bool {
   error
      .as_database_error()
      .and_then(|db_err| db_err.code())
      .and_then(|code| code.parse::<i32>().ok())
      .is_some_and(|code| code & 0xff == 8)
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
   let mut name: OsString = path.as_os_str().to_owned();
   name.push(suffix);
   PathBuf::from(name)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_is_journal_mode() {
      assert!(is_journal_mode("PRAGMA journal_mode = WAL"));
      assert!(!is_journal_mode("PRAGMA journal_size_limit = 134217728"));
      assert!(!is_readonly_error(&sqlx::Error::RowNotFound));
   }

   #[test]
   fn test_sidecar_path() {
      assert_eq!(
         sidecar_path(Path::new("/data/app.db"), "-wal"),
         PathBuf::from("/data/app.db-wal")
      );
      assert_eq!(
         sidecar_path(Path::new("app.db"), "-shm"),
         PathBuf::from("app.db-shm")
      );
   }
}
