//! Metadata handed to the external scheduler.

use std::time::{Duration, SystemTime};

use crate::profile::MaintenanceProfile;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// When a task should run by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTrigger {
   /// Fixed interval measured from the end of the last run
   Interval(Duration),
}

impl TaskTrigger {
   /// True if a task last run at `last_run` is due at `now`.
   ///
   /// A task that never ran is always due. A clock that moved backwards past
   /// `last_run` is treated as not due.
   pub fn is_due(&self, last_run: Option<SystemTime>, now: SystemTime) -> bool {
      match (self, last_run) {
         (_, None) => true,
         (TaskTrigger::Interval(interval), Some(last)) => now
            .duration_since(last)
            .map(|since| since >= *interval)
            .unwrap_or(false),
      }
   }
}

/// Descriptive and scheduling flags of a maintenance task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
   /// Stable identifier, safe to persist
   pub key: &'static str,
   pub name: &'static str,
   pub description: &'static str,
   pub category: &'static str,
   pub is_hidden: bool,
   pub is_enabled: bool,
   pub is_logged: bool,
   pub default_triggers: Vec<TaskTrigger>,
}

impl MaintenanceProfile {
   pub fn task_info(self) -> TaskInfo {
      match self {
         MaintenanceProfile::Quick => TaskInfo {
            key: "QuickDatabaseMaintenance",
            name: "Optimize database",
            description: "Checkpoints the write-ahead log, runs a quick consistency check and refreshes sampled statistics and indexes.",
            category: "Maintenance",
            is_hidden: false,
            is_enabled: true,
            is_logged: true,
            default_triggers: vec![TaskTrigger::Interval(DAY)],
         },
         MaintenanceProfile::Extended => TaskInfo {
            key: "ExtendedDatabaseMaintenance",
            name: "Rebuild database",
            description: "Runs a full integrity and foreign key check, rebuilds the database file and refreshes all statistics and indexes.",
            category: "Maintenance",
            is_hidden: false,
            is_enabled: true,
            is_logged: true,
            default_triggers: vec![TaskTrigger::Interval(7 * DAY)],
         },
      }
   }
}
