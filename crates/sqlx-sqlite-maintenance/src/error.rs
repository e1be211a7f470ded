//! Error types for the sqlx-sqlite-maintenance crate.
//!
//! These never escape [`MaintenanceTask::run`](crate::MaintenanceTask::run);
//! they end a single phase and are recorded in its
//! [`PhaseOutcome`](crate::PhaseOutcome).

/// Errors that can end a maintenance phase.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// SQLx database error.
   #[error("Database error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// An integrity or quick check reported damage.
   #[error("{check} reported: {detail}")]
   CheckFailed { check: &'static str, detail: String },

   /// Failure reported by a [`DataContext`](crate::DataContext) implementation.
   #[error("Data context error: {0}")]
   Context(String),
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
