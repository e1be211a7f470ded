//! Statement sequences for the quick and extended maintenance profiles.

use std::borrow::Cow;
use std::fmt;

use crate::{Error, Result};

/// Sample size used by the quick profile's `ANALYZE`
pub const QUICK_ANALYSIS_LIMIT: u32 = 1024;

/// One maintenance statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaintenanceStep {
   /// Merge the write-ahead log into the main file, waiting for readers
   WalCheckpoint,
   /// Fast structural check, stopping at the first error
   QuickCheck,
   /// Full structural check, stopping at the first error
   IntegrityCheck,
   /// Report rows violating foreign key constraints
   ForeignKeyCheck,
   /// Rebuild the file, reclaiming free pages
   Vacuum,
   /// Rows sampled per index by the following `ANALYZE`; 0 is exhaustive
   AnalysisLimit(u32),
   /// Refresh query planner statistics
   Analyze,
   Optimize,
   /// Rebuild every index
   Reindex,
}

impl MaintenanceStep {
   pub fn sql(self) -> Cow<'static, str> {
      match self {
         MaintenanceStep::WalCheckpoint => "PRAGMA wal_checkpoint(FULL)".into(),
         MaintenanceStep::QuickCheck => "PRAGMA quick_check(1)".into(),
         MaintenanceStep::IntegrityCheck => "PRAGMA integrity_check(1)".into(),
         MaintenanceStep::ForeignKeyCheck => "PRAGMA foreign_key_check".into(),
         MaintenanceStep::Vacuum => "VACUUM".into(),
         MaintenanceStep::AnalysisLimit(limit) => {
            format!("PRAGMA analysis_limit = {limit}").into()
         }
         MaintenanceStep::Analyze => "ANALYZE".into(),
         MaintenanceStep::Optimize => "PRAGMA optimize".into(),
         MaintenanceStep::Reindex => "REINDEX".into(),
      }
   }

   pub fn name(self) -> &'static str {
      match self {
         MaintenanceStep::WalCheckpoint => "wal_checkpoint",
         MaintenanceStep::QuickCheck => "quick_check",
         MaintenanceStep::IntegrityCheck => "integrity_check",
         MaintenanceStep::ForeignKeyCheck => "foreign_key_check",
         MaintenanceStep::Vacuum => "vacuum",
         MaintenanceStep::AnalysisLimit(_) => "analysis_limit",
         MaintenanceStep::Analyze => "analyze",
         MaintenanceStep::Optimize => "optimize",
         MaintenanceStep::Reindex => "reindex",
      }
   }

   /// Fails the step when a structural check returns anything but `ok`.
   ///
   /// `rows` holds the first column of each returned row. Other steps accept
   /// whatever they return.
   pub(crate) fn verify(self, rows: &[Option<String>]) -> Result<()> {
      match self {
         MaintenanceStep::IntegrityCheck | MaintenanceStep::QuickCheck => {
            match rows.first() {
               Some(Some(first)) if first.eq_ignore_ascii_case("ok") => Ok(()),
               _ => Err(Error::CheckFailed {
                  check: self.name(),
                  detail: rows
                     .iter()
                     .map(|row| row.as_deref().unwrap_or("NULL"))
                     .collect::<Vec<_>>()
                     .join("; "),
               }),
            }
         }
         _ => Ok(()),
      }
   }
}

impl fmt::Display for MaintenanceStep {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.sql())
   }
}

/// Which maintenance sequence to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaintenanceProfile {
   /// Daily: checkpoint, quick check, sampled statistics, reindex
   Quick,
   /// Weekly: full check, foreign keys, vacuum, exhaustive statistics, reindex
   Extended,
}

const QUICK_STEPS: &[MaintenanceStep] = &[
   MaintenanceStep::WalCheckpoint,
   MaintenanceStep::QuickCheck,
   MaintenanceStep::AnalysisLimit(QUICK_ANALYSIS_LIMIT),
   MaintenanceStep::Analyze,
   MaintenanceStep::Optimize,
   MaintenanceStep::Reindex,
];

const EXTENDED_STEPS: &[MaintenanceStep] = &[
   MaintenanceStep::IntegrityCheck,
   MaintenanceStep::ForeignKeyCheck,
   MaintenanceStep::Vacuum,
   MaintenanceStep::AnalysisLimit(0),
   MaintenanceStep::Analyze,
   MaintenanceStep::Optimize,
   MaintenanceStep::Reindex,
];

impl MaintenanceProfile {
   pub fn steps(self) -> &'static [MaintenanceStep] {
      match self {
         MaintenanceProfile::Quick => QUICK_STEPS,
         MaintenanceProfile::Extended => EXTENDED_STEPS,
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn sql_of(profile: MaintenanceProfile) -> Vec<String> {
      profile
         .steps()
         .iter()
         .map(|step| step.sql().into_owned())
         .collect()
   }

   #[test]
   fn test_quick_sequence() {
      assert_eq!(
         sql_of(MaintenanceProfile::Quick),
         vec![
            "PRAGMA wal_checkpoint(FULL)",
            "PRAGMA quick_check(1)",
            "PRAGMA analysis_limit = 1024",
            "ANALYZE",
            "PRAGMA optimize",
            "REINDEX",
         ]
      );
   }

   #[test]
   fn test_extended_sequence() {
      assert_eq!(
         sql_of(MaintenanceProfile::Extended),
         vec![
            "PRAGMA integrity_check(1)",
            "PRAGMA foreign_key_check",
            "VACUUM",
            "PRAGMA analysis_limit = 0",
            "ANALYZE",
            "PRAGMA optimize",
            "REINDEX",
         ]
      );
   }

   #[test]
   fn test_quick_skips_expensive_checks() {
      let sql = sql_of(MaintenanceProfile::Quick).join("\n");

      assert!(!sql.contains("integrity_check"));
      assert!(!sql.contains("foreign_key_check"));
      assert!(!sql.contains("VACUUM"));
      assert!(!sql.contains("analysis_limit = 0"));
   }

   #[test]
   fn test_extended_skips_quick_steps() {
      let sql = sql_of(MaintenanceProfile::Extended).join("\n");

      assert!(!sql.contains("wal_checkpoint"));
      assert!(!sql.contains("quick_check"));
   }

   #[test]
   fn test_verify_checks() {
      let ok = vec![Some("ok".to_string())];
      let damaged = vec![
         Some("*** in database main ***".to_string()),
         Some("Page 5: btreeInitPage() returns error code 11".to_string()),
      ];

      assert!(MaintenanceStep::IntegrityCheck.verify(&ok).is_ok());
      assert!(MaintenanceStep::QuickCheck.verify(&ok).is_ok());

      let err = MaintenanceStep::IntegrityCheck.verify(&damaged).unwrap_err();
      assert!(err.to_string().starts_with("integrity_check reported"));
      assert!(err.to_string().contains("Page 5"));

      assert!(MaintenanceStep::QuickCheck.verify(&[]).is_err());

      // Non-check steps accept anything
      assert!(MaintenanceStep::ForeignKeyCheck.verify(&damaged).is_ok());
      assert!(MaintenanceStep::Vacuum.verify(&[]).is_ok());
   }
}
