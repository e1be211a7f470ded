//! The maintenance task: runs a profile against every configured store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::context::{DataContext, RawSession, StorageEngine};
use crate::profile::{MaintenanceProfile, MaintenanceStep};
use crate::report::{MaintenanceReport, PhaseOutcome, PhaseReport, TargetKind};
use crate::schedule::TaskInfo;

/// Periodic maintenance for one or more SQLite stores.
///
/// Each primary store is opened with its own short-lived connection, outside
/// any connection manager's write gate, and closed when its phase ends. A
/// secondary store may be reached through a [`DataContext`]; it is only
/// maintained when it is backed by SQLite.
///
/// Phases are independent: a failure is logged, recorded in the report and
/// the next phase still runs. [`run`](Self::run) itself never fails.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_maintenance::MaintenanceTask;
///
/// # async fn example() {
/// let report = MaintenanceTask::quick()
///    .with_store("library.db")
///    .with_store("users.db")
///    .run()
///    .await;
///
/// for failure in report.failures() {
///    eprintln!("{} needs attention", failure.target);
/// }
/// # }
/// ```
pub struct MaintenanceTask {
   profile: MaintenanceProfile,
   stores: Vec<PathBuf>,
   context: Option<Arc<dyn DataContext>>,
   progress: Option<watch::Sender<f64>>,
}

impl MaintenanceTask {
   pub fn new(profile: MaintenanceProfile) -> Self {
      Self {
         profile,
         stores: Vec::new(),
         context: None,
         progress: None,
      }
   }

   /// Daily checkpoint, quick check and sampled statistics
   pub fn quick() -> Self {
      Self::new(MaintenanceProfile::Quick)
   }

   /// Weekly full check, vacuum and exhaustive statistics
   pub fn extended() -> Self {
      Self::new(MaintenanceProfile::Extended)
   }

   /// Adds a primary store file. The file must already exist.
   pub fn with_store(mut self, path: impl Into<PathBuf>) -> Self {
      self.stores.push(path.into());
      self
   }

   /// Adds the store managed by a
   /// [`SqliteDatabase`](sqlx_sqlite_conn_mgr::SqliteDatabase).
   ///
   /// Only the path is used; maintenance does not go through the database's
   /// writer.
   #[cfg(feature = "conn-mgr")]
   pub fn with_database(self, db: &sqlx_sqlite_conn_mgr::SqliteDatabase) -> Self {
      self.with_store(db.path())
   }

   /// Sets the secondary store
   pub fn with_context(mut self, context: Arc<dyn DataContext>) -> Self {
      self.context = Some(context);
      self
   }

   /// Publishes completion percentage (0 to 100) as phases finish
   pub fn with_progress(mut self, progress: watch::Sender<f64>) -> Self {
      self.progress = Some(progress);
      self
   }

   pub fn profile(&self) -> MaintenanceProfile {
      self.profile
   }

   pub fn info(&self) -> TaskInfo {
      self.profile.task_info()
   }

   /// Runs every phase and reports what happened.
   pub async fn run(&self) -> MaintenanceReport {
      let started = Instant::now();
      let total = self.stores.len() + usize::from(self.context.is_some());
      let mut phases = Vec::with_capacity(total);

      info!(profile = ?self.profile, stores = total, "Starting database maintenance");
      self.report_progress(0, total);

      for path in &self.stores {
         let phase = self.run_file_phase(path).await;
         phase.log();
         phases.push(phase);
         self.report_progress(phases.len(), total);
      }

      if let Some(context) = &self.context {
         let phase = self.run_context_phase(context.as_ref()).await;
         phase.log();
         phases.push(phase);
         self.report_progress(phases.len(), total);
      }

      let report = MaintenanceReport {
         profile: self.profile,
         phases,
         elapsed: started.elapsed(),
      };

      info!(
         profile = ?self.profile,
         failures = report.failures().count(),
         elapsed_ms = report.elapsed.as_millis() as u64,
         "Finished database maintenance"
      );

      report
   }

   async fn run_file_phase(&self, path: &Path) -> PhaseReport {
      let started = Instant::now();
      let target = path.display().to_string();

      let outcome = match open_raw(path).await {
         Ok(conn) => run_session(Box::new(conn), self.profile.steps(), &target).await,
         Err(e) => PhaseOutcome::Failed {
            step: None,
            completed: Vec::new(),
            error: e.to_string(),
         },
      };

      PhaseReport {
         target,
         kind: TargetKind::File,
         outcome,
         elapsed: started.elapsed(),
      }
   }

   async fn run_context_phase(&self, context: &dyn DataContext) -> PhaseReport {
      let started = Instant::now();
      let target = context.name().to_string();

      let outcome = match context.engine() {
         StorageEngine::Sqlite => match context.session().await {
            Ok(session) => run_session(session, self.profile.steps(), &target).await,
            Err(e) => PhaseOutcome::Failed {
               step: None,
               completed: Vec::new(),
               error: e.to_string(),
            },
         },
         engine => PhaseOutcome::Skipped {
            reason: format!("storage engine is {engine}, not sqlite"),
         },
      };

      PhaseReport {
         target,
         kind: TargetKind::Context,
         outcome,
         elapsed: started.elapsed(),
      }
   }

   fn report_progress(&self, done: usize, total: usize) {
      if let Some(progress) = &self.progress {
         let percent = if total == 0 {
            100.0
         } else {
            done as f64 * 100.0 / total as f64
         };
         progress.send_replace(percent);
      }
   }
}

/// Opens a dedicated connection to an existing store file.
async fn open_raw(path: &Path) -> sqlx::Result<SqliteConnection> {
   let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(false);

   SqliteConnection::connect_with(&options).await
}

/// Runs `steps` in order, stopping at the first failure, then ends the session.
async fn run_session(
   mut session: Box<dyn RawSession>,
   steps: &[MaintenanceStep],
   target: &str,
) -> PhaseOutcome {
   let mut completed = Vec::with_capacity(steps.len());
   let mut outcome = None;

   for &step in steps {
      let sql = step.sql();
      debug!(target_store = %target, statement = %sql, "Running maintenance step");

      let result = match session.execute_raw(&sql).await {
         Ok(rows) => step.verify(&rows).map(|()| rows),
         Err(e) => Err(e),
      };

      match result {
         Ok(rows) => {
            if step == MaintenanceStep::ForeignKeyCheck && !rows.is_empty() {
               warn!(
                  target_store = %target,
                  violations = rows.len(),
                  "Foreign key violations found"
               );
            }
            completed.push(step);
         }
         Err(e) => {
            outcome = Some(PhaseOutcome::Failed {
               step: Some(step),
               completed: std::mem::take(&mut completed),
               error: e.to_string(),
            });
            break;
         }
      }
   }

   if let Err(e) = session.close().await {
      warn!(target_store = %target, error = %e, "Failed to close maintenance connection");
   }

   outcome.unwrap_or(PhaseOutcome::Completed { steps: completed })
}
