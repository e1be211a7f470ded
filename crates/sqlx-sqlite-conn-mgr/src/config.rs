//! Configuration for SQLite connections: pragma tuning and write-gate policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 128 MiB cap on the write-ahead log left behind after a checkpoint.
pub const DEFAULT_JOURNAL_SIZE_LIMIT: i64 = 128 * 1024 * 1024;

/// 8 GiB of memory-mapped I/O. SQLite clamps this to its compile-time maximum.
pub const DEFAULT_MMAP_SIZE: i64 = 8 * 1024 * 1024 * 1024;

/// Value of `PRAGMA locking_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockingMode {
   Normal,
   Exclusive,
}

impl LockingMode {
   pub fn as_str(self) -> &'static str {
      match self {
         LockingMode::Normal => "NORMAL",
         LockingMode::Exclusive => "EXCLUSIVE",
      }
   }
}

/// Value of `PRAGMA journal_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
   Delete,
   Truncate,
   Persist,
   Memory,
   Wal,
   Off,
}

impl JournalMode {
   pub fn as_str(self) -> &'static str {
      match self {
         JournalMode::Delete => "DELETE",
         JournalMode::Truncate => "TRUNCATE",
         JournalMode::Persist => "PERSIST",
         JournalMode::Memory => "MEMORY",
         JournalMode::Wal => "WAL",
         JournalMode::Off => "OFF",
      }
   }
}

/// Durability level of `PRAGMA synchronous`, issued as SQLite's numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
   Off,
   Normal,
   Full,
   Extra,
}

impl Synchronous {
   pub fn code(self) -> u8 {
      match self {
         Synchronous::Off => 0,
         Synchronous::Normal => 1,
         Synchronous::Full => 2,
         Synchronous::Extra => 3,
      }
   }
}

/// Location of temporary tables and indices, issued as SQLite's numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempStore {
   Default,
   File,
   Memory,
}

impl TempStore {
   pub fn code(self) -> u8 {
      match self {
         TempStore::Default => 0,
         TempStore::File => 1,
         TempStore::Memory => 2,
      }
   }
}

/// Storage engine tuning applied to every physical connection.
///
/// Each field is optional; `None` skips the corresponding statement. The one
/// exception is `temp_store`, which is always issued and falls back to
/// [`TempStore::Default`] when unset.
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_conn_mgr::PragmaConfig;
///
/// // A store with a larger page cache and no memory mapping
/// let pragmas = PragmaConfig {
///     cache_size: Some(-20_000),
///     mmap_size: None,
///     ..Default::default()
/// };
///
/// assert_eq!(pragmas.statements()[0], "PRAGMA cache_size = -20000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PragmaConfig {
   /// Page cache size. Positive values are pages, negative values are KiB.
   ///
   /// Default: unset (engine default)
   pub cache_size: Option<i64>,

   /// Default: `NORMAL`
   pub locking_mode: Option<LockingMode>,

   /// Default: `WAL`
   pub journal_mode: Option<JournalMode>,

   /// Maximum size in bytes a journal or WAL file is truncated to after use.
   ///
   /// The engine default is unbounded, which lets the WAL grow without limit
   /// under sustained writes.
   ///
   /// Default: 128 MiB
   pub journal_size_limit: Option<i64>,

   /// Default: `NORMAL`
   pub synchronous: Option<Synchronous>,

   /// Page size in bytes. Only takes effect on a new file or after `VACUUM`.
   ///
   /// Default: unset (engine default)
   pub page_size: Option<u32>,

   /// Default: 8 GiB
   pub mmap_size: Option<i64>,

   /// Default: `MEMORY`
   pub temp_store: Option<TempStore>,
}

impl Default for PragmaConfig {
   fn default() -> Self {
      Self {
         cache_size: None,
         locking_mode: Some(LockingMode::Normal),
         journal_mode: Some(JournalMode::Wal),
         journal_size_limit: Some(DEFAULT_JOURNAL_SIZE_LIMIT),
         synchronous: Some(Synchronous::Normal),
         page_size: None,
         mmap_size: Some(DEFAULT_MMAP_SIZE),
         temp_store: Some(TempStore::Memory),
      }
   }
}

impl PragmaConfig {
   /// Resolves the configuration into the ordered list of statements applied
   /// to a freshly opened connection.
   pub fn statements(&self) -> Vec<String> {
      let mut statements = Vec::with_capacity(8);

      if let Some(cache_size) = self.cache_size {
         statements.push(format!("PRAGMA cache_size = {cache_size}"));
      }
      if let Some(mode) = self.locking_mode {
         statements.push(format!("PRAGMA locking_mode = {}", mode.as_str()));
      }
      if let Some(mode) = self.journal_mode {
         statements.push(format!("PRAGMA journal_mode = {}", mode.as_str()));
      }
      if let Some(limit) = self.journal_size_limit {
         statements.push(format!("PRAGMA journal_size_limit = {limit}"));
      }
      if let Some(level) = self.synchronous {
         statements.push(format!("PRAGMA synchronous = {}", level.code()));
      }
      if let Some(page_size) = self.page_size {
         statements.push(format!("PRAGMA page_size = {page_size}"));
      }
      if let Some(mmap_size) = self.mmap_size {
         statements.push(format!("PRAGMA mmap_size = {mmap_size}"));
      }

      let temp_store = self.temp_store.unwrap_or(TempStore::Default);
      statements.push(format!("PRAGMA temp_store = {}", temp_store.code()));

      statements
   }
}

/// Configuration for a [`SqliteDatabase`](crate::SqliteDatabase)
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_conn_mgr::{PragmaConfig, SqliteDatabaseConfig};
/// use std::time::Duration;
///
/// // Use defaults: unbounded wait for the writer
/// let config = SqliteDatabaseConfig::default();
///
/// // Fail writers that wait longer than five seconds
/// let config = SqliteDatabaseConfig {
///     write_timeout: Some(Duration::from_secs(5)),
///     ..Default::default()
/// };
///
/// // Override a single pragma
/// let config = SqliteDatabaseConfig {
///     pragmas: PragmaConfig {
///         page_size: Some(8192),
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteDatabaseConfig {
   /// Tuning applied to the writer and to every reader
   pub pragmas: PragmaConfig,

   /// Upper bound on how long `acquire_writer` waits for the write gate
   ///
   /// `None` waits until the gate is granted, however long the current
   /// holder keeps it.
   ///
   /// Default: `None`
   pub write_timeout: Option<Duration>,
}
