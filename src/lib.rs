//! # sqlite-steward
//!
//! Connection lifecycle and upkeep for embedded SQLite stores.
//!
//! This crate ties the workspace together:
//!
//! - [`sqlx_sqlite_conn_mgr`]: one persistent writer behind an async write
//!   gate, owned read-only readers, uniform pragma tuning
//! - [`sqlx_sqlite_toolkit`]: schema introspection and additive column
//!   migration
//! - [`sqlx_sqlite_maintenance`]: quick and extended maintenance tasks
//!
//! [`StoreInstances`] is the registry an application keeps for its open
//! stores, one [`SqliteDatabase`] per path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

mod error;

pub use error::{Error, Result};
pub use sqlx_sqlite_conn_mgr::{
   ConnectionHandle, ConnectionStats, JournalMode, LockingMode, PragmaConfig, SqliteDatabase,
   SqliteDatabaseConfig, Synchronous, TempStore,
};
pub use sqlx_sqlite_maintenance::{
   DataContext, MaintenanceProfile, MaintenanceReport, MaintenanceStep, MaintenanceTask,
   PhaseOutcome, PoolContext, StorageEngine, TaskInfo, TaskTrigger,
};
pub use sqlx_sqlite_toolkit::{ColumnDescriptor, ensure_columns, list_columns, table_exists};

pub use sqlx_sqlite_conn_mgr;
pub use sqlx_sqlite_maintenance;
pub use sqlx_sqlite_toolkit;

/// Open stores, keyed by path.
///
/// Owned by the application and passed to whatever needs a store, so every
/// caller asking for the same path shares one writer and one write gate.
#[derive(Default)]
pub struct StoreInstances(RwLock<HashMap<PathBuf, Arc<SqliteDatabase>>>);

impl StoreInstances {
   pub fn new() -> Self {
      Self::default()
   }

   /// Returns the store registered for `path`, connecting it first if needed.
   ///
   /// `config` only applies when the store is connected by this call. A store
   /// that was closed through its own handle is replaced.
   pub async fn open(
      &self,
      path: impl AsRef<Path>,
      config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<SqliteDatabase>> {
      let path = path.as_ref();

      if let Some(db) = self.get(path).await {
         return Ok(db);
      }

      let mut instances = self.0.write().await;

      // Another task may have connected while we waited for the lock
      if let Some(db) = instances.get(path).filter(|db| !db.is_closed()) {
         return Ok(Arc::clone(db));
      }

      let db = SqliteDatabase::connect(path, config).await?;
      instances.insert(path.to_path_buf(), Arc::clone(&db));
      debug!(path = %path.display(), "Registered store");

      Ok(db)
   }

   /// Returns the open store registered for `path`.
   pub async fn get(&self, path: impl AsRef<Path>) -> Option<Arc<SqliteDatabase>> {
      let instances = self.0.read().await;

      instances
         .get(path.as_ref())
         .filter(|db| !db.is_closed())
         .cloned()
   }

   /// Paths of every registered store.
   pub async fn paths(&self) -> Vec<PathBuf> {
      self.0.read().await.keys().cloned().collect()
   }

   /// Closes and unregisters the store at `path`.
   pub async fn close(&self, path: impl AsRef<Path>) -> Result<()> {
      let path = path.as_ref();
      let db = self
         .0
         .write()
         .await
         .remove(path)
         .ok_or_else(|| Error::StoreNotLoaded(path.display().to_string()))?;

      db.close().await?;
      Ok(())
   }

   /// Closes and unregisters every store.
   ///
   /// All stores are closed even when some fail; the first error is returned.
   pub async fn close_all(&self) -> Result<()> {
      let drained: Vec<_> = self.0.write().await.drain().collect();
      let mut first_error = None;

      for (path, db) in drained {
         if let Err(e) = db.close().await {
            warn!(path = %path.display(), error = %e, "Failed to close store");
            first_error.get_or_insert(e);
         }
      }

      match first_error {
         Some(e) => Err(e.into()),
         None => Ok(()),
      }
   }

   /// Closes and unregisters the store at `path`, then deletes its files.
   pub async fn remove(&self, path: impl AsRef<Path>) -> Result<()> {
      let path = path.as_ref();
      let db = self
         .0
         .write()
         .await
         .remove(path)
         .ok_or_else(|| Error::StoreNotLoaded(path.display().to_string()))?;

      db.remove().await?;
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use tempfile::TempDir;

   #[tokio::test]
   async fn test_open_returns_same_instance() {
      let temp = TempDir::new().unwrap();
      let path = temp.path().join("shared.db");
      let instances = StoreInstances::new();

      let first = instances.open(&path, None).await.unwrap();
      let second = instances.open(&path, None).await.unwrap();

      assert!(Arc::ptr_eq(&first, &second));
      assert_eq!(instances.paths().await, vec![path.clone()]);

      instances.close_all().await.unwrap();
   }

   #[tokio::test]
   async fn test_concurrent_open_shares_writer() {
      let temp = TempDir::new().unwrap();
      let path = temp.path().join("shared.db");
      let instances = Arc::new(StoreInstances::new());

      let mut tasks = Vec::new();
      for _ in 0..8 {
         let instances = Arc::clone(&instances);
         let path = path.clone();
         tasks.push(tokio::spawn(async move {
            let db = instances.open(&path, None).await.unwrap();
            let mut writer = db.acquire_writer().await.unwrap();
            sqlx::query("CREATE TABLE IF NOT EXISTS t (id INTEGER)")
               .execute(&mut *writer)
               .await
               .unwrap();
            db
         }));
      }

      let mut dbs = Vec::new();
      for task in tasks {
         dbs.push(task.await.unwrap());
      }

      assert!(dbs.iter().all(|db| Arc::ptr_eq(db, &dbs[0])));
      assert_eq!(dbs[0].stats().writers_opened, 1);

      instances.close_all().await.unwrap();
   }

   #[tokio::test]
   async fn test_close_unregisters() {
      let temp = TempDir::new().unwrap();
      let path = temp.path().join("closing.db");
      let instances = StoreInstances::new();

      let db = instances.open(&path, None).await.unwrap();
      instances.close(&path).await.unwrap();

      assert!(db.is_closed());
      assert!(instances.get(&path).await.is_none());

      let err = instances.close(&path).await.unwrap_err();
      assert_eq!(err.error_code(), "STORE_NOT_LOADED");
   }

   #[tokio::test]
   async fn test_reopen_after_handle_closed() {
      let temp = TempDir::new().unwrap();
      let path = temp.path().join("reopen.db");
      let instances = StoreInstances::new();

      let first = instances.open(&path, None).await.unwrap();
      first.close().await.unwrap();

      let second = instances.open(&path, None).await.unwrap();
      assert!(!Arc::ptr_eq(&first, &second));
      assert!(!second.is_closed());

      instances.close_all().await.unwrap();
   }

   #[tokio::test]
   async fn test_close_all_closes_every_store() {
      let temp = TempDir::new().unwrap();
      let instances = StoreInstances::new();

      let a = instances.open(temp.path().join("a.db"), None).await.unwrap();
      let b = instances.open(temp.path().join("b.db"), None).await.unwrap();

      instances.close_all().await.unwrap();

      assert!(a.is_closed() && b.is_closed());
      assert!(instances.paths().await.is_empty());
   }

   #[tokio::test]
   async fn test_remove_deletes_files() {
      let temp = TempDir::new().unwrap();
      let path = temp.path().join("gone.db");
      let instances = StoreInstances::new();

      let db = instances.open(&path, None).await.unwrap();
      let writer = db.acquire_writer().await.unwrap();
      writer.release().await.unwrap();
      assert!(path.exists());

      instances.remove(&path).await.unwrap();

      assert!(!path.exists());
      assert!(instances.get(&path).await.is_none());
   }
}
