//! Outcomes of a maintenance run.

use std::time::Duration;

use tracing::{error, info};

use crate::profile::{MaintenanceProfile, MaintenanceStep};

/// How a phase reached its store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
   /// Primary store, opened directly by path
   File,
   /// Secondary store, reached through a [`DataContext`](crate::DataContext)
   Context,
}

/// Result of running a profile's steps against one store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
   Completed {
      steps: Vec<MaintenanceStep>,
   },
   /// The store was not maintained, e.g. a non-SQLite data context
   Skipped {
      reason: String,
   },
   Failed {
      /// Step that failed; `None` if the store could not be opened
      step: Option<MaintenanceStep>,
      /// Steps that finished before the failure
      completed: Vec<MaintenanceStep>,
      error: String,
   },
}

/// One phase of a run: a target store and what happened to it
#[derive(Debug, Clone)]
pub struct PhaseReport {
   pub target: String,
   pub kind: TargetKind,
   pub outcome: PhaseOutcome,
   pub elapsed: Duration,
}

impl PhaseReport {
   pub fn is_failure(&self) -> bool {
      matches!(self.outcome, PhaseOutcome::Failed { .. })
   }

   /// Writes the outcome to the log. This is the only place a maintenance
   /// failure surfaces.
   pub(crate) fn log(&self) {
      match &self.outcome {
         PhaseOutcome::Completed { steps } => info!(
            target_store = %self.target,
            kind = ?self.kind,
            steps = steps.len(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            "Database maintenance completed"
         ),
         PhaseOutcome::Skipped { reason } => info!(
            target_store = %self.target,
            kind = ?self.kind,
            reason = %reason,
            "Database maintenance skipped"
         ),
         PhaseOutcome::Failed {
            step,
            completed,
            error,
         } => error!(
            target_store = %self.target,
            kind = ?self.kind,
            step = step.map(MaintenanceStep::name).unwrap_or("open"),
            completed = completed.len(),
            error = %error,
            "Database maintenance failed"
         ),
      }
   }
}

/// Everything a single [`MaintenanceTask::run`](crate::MaintenanceTask::run) did
#[derive(Debug, Clone)]
pub struct MaintenanceReport {
   pub profile: MaintenanceProfile,
   /// File phases in the order the stores were added, then the context phase
   pub phases: Vec<PhaseReport>,
   pub elapsed: Duration,
}

impl MaintenanceReport {
   pub fn failures(&self) -> impl Iterator<Item = &PhaseReport> {
      self.phases.iter().filter(|phase| phase.is_failure())
   }

   pub fn is_success(&self) -> bool {
      self.failures().next().is_none()
   }
}
