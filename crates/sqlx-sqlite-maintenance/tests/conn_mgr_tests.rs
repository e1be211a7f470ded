//! Integration tests for the conn-mgr feature.
//!
//! Run with: cargo test --features conn-mgr

#![cfg(feature = "conn-mgr")]

use std::sync::Arc;

use sqlx_sqlite_conn_mgr::SqliteDatabase;
use sqlx_sqlite_maintenance::{MaintenanceProfile, MaintenanceTask, PhaseOutcome};
use tempfile::TempDir;

struct TestDb {
   db: Arc<SqliteDatabase>,
   _dir: TempDir,
}

async fn setup_test_db() -> TestDb {
   let dir = TempDir::new().unwrap();
   let db = SqliteDatabase::connect(dir.path().join("managed.db"), None)
      .await
      .unwrap();

   let mut writer = db.acquire_writer().await.unwrap();
   sqlx::query(
      r#"
      CREATE TABLE notes (
         id INTEGER PRIMARY KEY AUTOINCREMENT,
         body TEXT NOT NULL
      )
      "#,
   )
   .execute(&mut *writer)
   .await
   .unwrap();

   for i in 0..50 {
      sqlx::query("INSERT INTO notes (body) VALUES (?)")
         .bind(format!("note {i}"))
         .execute(&mut *writer)
         .await
         .unwrap();
   }
   writer.release().await.unwrap();

   TestDb { db, _dir: dir }
}

#[tokio::test]
async fn test_maintains_managed_database() {
   let test_db = setup_test_db().await;

   let report = MaintenanceTask::extended()
      .with_database(&test_db.db)
      .run()
      .await;

   assert_eq!(
      report.phases[0].target,
      test_db.db.path().display().to_string()
   );
   assert_eq!(
      report.phases[0].outcome,
      PhaseOutcome::Completed {
         steps: MaintenanceProfile::Extended.steps().to_vec()
      }
   );

   // The managed writer is still usable afterwards
   let mut writer = test_db.db.acquire_writer().await.unwrap();
   sqlx::query("INSERT INTO notes (body) VALUES ('after')")
      .execute(&mut *writer)
      .await
      .unwrap();
   writer.release().await.unwrap();

   let mut reader = test_db.db.acquire_reader().await.unwrap();
   let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
      .fetch_one(&mut *reader)
      .await
      .unwrap();
   reader.release().await.unwrap();
   assert_eq!(count, 51);

   test_db.db.close().await.unwrap();
}

#[tokio::test]
async fn test_quick_profile_with_open_reader() {
   let test_db = setup_test_db().await;
   let mut reader = test_db.db.acquire_reader().await.unwrap();

   let report = MaintenanceTask::quick()
      .with_database(&test_db.db)
      .run()
      .await;

   assert!(report.is_success(), "{:?}", report.phases);

   let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
      .fetch_one(&mut *reader)
      .await
      .unwrap();
   assert_eq!(count, 50);

   reader.release().await.unwrap();
   test_db.db.close().await.unwrap();
}
