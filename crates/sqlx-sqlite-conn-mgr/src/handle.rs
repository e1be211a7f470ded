//! RAII handle over one physical SQLite connection

use std::fmt;
use std::ops::{Deref, DerefMut};

use sqlx::{Connection, SqliteConnection};
use tokio::sync::OwnedMappedMutexGuard;
use tracing::trace;

use crate::Result;

/// Slot holding the persistent writer; `None` until the first write acquire
/// and again after the database is closed.
pub(crate) type WriterSlot = Option<SqliteConnection>;

enum Inner {
   /// Holds the write gate for as long as the handle lives
   Writer(OwnedMappedMutexGuard<WriterSlot, SqliteConnection>),
   /// Owned, unshared read-only connection
   Reader(SqliteConnection),
}

/// Handle to a physical connection obtained from a
/// [`SqliteDatabase`](crate::SqliteDatabase).
///
/// A writer handle holds the database's write gate. Releasing it (or dropping
/// it) reopens the gate for the next writer but leaves the physical
/// connection open for reuse.
///
/// A reader handle owns its connection outright. Releasing it closes the
/// connection; dropping it does the same without waiting for the close to
/// finish.
///
/// Derefs to [`SqliteConnection`], so it can be used directly as an executor:
///
/// ```no_run
/// # async fn example(db: &sqlx_sqlite_conn_mgr::SqliteDatabase) -> sqlx_sqlite_conn_mgr::Result<()> {
/// let mut writer = db.acquire_writer().await?;
/// sqlx::query("INSERT INTO users (name) VALUES (?)")
///    .bind("Alice")
///    .execute(&mut *writer)
///    .await?;
/// writer.release().await?;
/// # Ok(())
/// # }
/// ```
#[must_use = "if unused, the connection is immediately released"]
pub struct ConnectionHandle {
   inner: Inner,
}

impl ConnectionHandle {
   pub(crate) fn writer(guard: OwnedMappedMutexGuard<WriterSlot, SqliteConnection>) -> Self {
      Self {
         inner: Inner::Writer(guard),
      }
   }

   pub(crate) fn reader(conn: SqliteConnection) -> Self {
      Self {
         inner: Inner::Reader(conn),
      }
   }

   /// True if this handle wraps the shared writer connection
   pub fn is_writer(&self) -> bool {
      matches!(self.inner, Inner::Writer(_))
   }

   /// Releases the handle.
   ///
   /// For the writer this only releases the write gate. For a reader the
   /// connection is closed and any error from closing it is returned.
   pub async fn release(self) -> Result<()> {
      match self.inner {
         Inner::Writer(guard) => {
            drop(guard);
            trace!("Write gate released");
            Ok(())
         }
         Inner::Reader(conn) => {
            conn.close().await?;
            trace!("Reader connection closed");
            Ok(())
         }
      }
   }
}

impl fmt::Debug for ConnectionHandle {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("ConnectionHandle")
         .field("is_writer", &self.is_writer())
         .finish_non_exhaustive()
   }
}

impl Deref for ConnectionHandle {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      match &self.inner {
         Inner::Writer(guard) => &**guard,
         Inner::Reader(conn) => conn,
      }
   }
}

impl DerefMut for ConnectionHandle {
   fn deref_mut(&mut self) -> &mut Self::Target {
      match &mut self.inner {
         Inner::Writer(guard) => &mut **guard,
         Inner::Reader(conn) => conn,
      }
   }
}
