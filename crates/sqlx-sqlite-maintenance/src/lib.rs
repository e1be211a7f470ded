//! # sqlx-sqlite-maintenance
//!
//! Scheduled upkeep for SQLite stores: consistency checks, write-ahead log
//! checkpoints, file rebuilds and statistics refresh.
//!
//! Two profiles are provided:
//!
//! - **[`MaintenanceProfile::Quick`]** (daily): `wal_checkpoint(FULL)`,
//!   `quick_check(1)`, `ANALYZE` sampling 1024 rows per index, `optimize`,
//!   `REINDEX`
//! - **[`MaintenanceProfile::Extended`]** (weekly): `integrity_check(1)`,
//!   `foreign_key_check`, `VACUUM`, exhaustive `ANALYZE`, `optimize`, `REINDEX`
//!
//! A [`MaintenanceTask`] runs one profile against any number of store files
//! and, optionally, a secondary store exposed through a [`DataContext`].
//! Failures never propagate; they are logged and returned in the
//! [`MaintenanceReport`].
//!
//! The task does not decide when it runs. [`MaintenanceTask::info`] describes
//! it to whatever scheduler the host application uses.
//!
//! Enable the `conn-mgr` feature to add stores directly from a
//! `sqlx_sqlite_conn_mgr::SqliteDatabase`.

mod context;
mod error;
mod profile;
mod report;
mod schedule;
mod task;

pub use context::{DataContext, PoolContext, RawSession, StorageEngine};
pub use error::{Error, Result};
pub use profile::{MaintenanceProfile, MaintenanceStep, QUICK_ANALYSIS_LIMIT};
pub use report::{MaintenanceReport, PhaseOutcome, PhaseReport, TargetKind};
pub use schedule::{TaskInfo, TaskTrigger};
pub use task::MaintenanceTask;

// Re-export for DataContext implementors
pub use futures::future::BoxFuture;
