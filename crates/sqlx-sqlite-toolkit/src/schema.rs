//! Schema introspection and additive migration for SQLite tables.
//!
//! Used while a store initializes or upgrades: check whether a table exists,
//! read its columns, and add columns that older files are missing. Nothing
//! here drops or renames a column.

use regex::Regex;
use sqlx::{Row, SqliteConnection};
use sqlx_sqlite_conn_mgr::SqliteDatabase;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::{Error, Result};

/// A column as reported by `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
   pub name: String,
   /// Declared type exactly as written in the schema; empty when none was given
   pub declared_type: String,
}

/// Checks whether a table exists, ignoring case (`Users` matches `users`).
pub async fn table_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
   let sql = r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type = 'table' AND name = ?1 COLLATE NOCASE
        )
    "#;

   let exists: bool = sqlx::query_scalar(sql)
      .bind(name)
      .fetch_one(&mut *conn)
      .await?;

   Ok(exists)
}

/// Lists a table's column names in declaration order.
///
/// Returns an empty list if the table doesn't exist.
pub async fn list_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>> {
   Ok(table_columns(conn, table)
      .await?
      .into_iter()
      .map(|column| column.name)
      .collect())
}

/// Describes a table's columns in declaration order.
///
/// Returns an empty list if the table doesn't exist.
pub async fn table_columns(
   conn: &mut SqliteConnection,
   table: &str,
) -> Result<Vec<ColumnDescriptor>> {
   // PRAGMA table_info returns: cid, name, type, notnull, dflt_value, pk
   let pragma = format!("PRAGMA table_info({})", quote_identifier(table));

   let rows = sqlx::query(&pragma).fetch_all(&mut *conn).await?;

   let mut columns: Vec<(i64, ColumnDescriptor)> = rows
      .iter()
      .map(|row| {
         let cid: i64 = row.get("cid");
         let column = ColumnDescriptor {
            name: row.get("name"),
            declared_type: row.get("type"),
         };
         (cid, column)
      })
      .collect();

   columns.sort_by_key(|(cid, _)| *cid);

   Ok(columns.into_iter().map(|(_, column)| column).collect())
}

/// Adds a nullable column unless `known_columns` already has it.
///
/// The membership check ignores case. Returns `true` if the column was added.
pub async fn add_column_if_absent(
   conn: &mut SqliteConnection,
   table: &str,
   column: &str,
   declared_type: &str,
   known_columns: &[String],
) -> Result<bool> {
   if known_columns
      .iter()
      .any(|known| known.eq_ignore_ascii_case(column))
   {
      return Ok(false);
   }

   validate_column_type(declared_type)?;

   let sql = add_column_sql(table, column, declared_type);
   sqlx::query(&sql).execute(&mut *conn).await?;

   info!(table = %table, column = %column, declared_type = %declared_type, "Added column");
   Ok(true)
}

/// Adds every column in `columns` that `table` doesn't have yet.
///
/// Runs on the database's writer, so it is serialized with other writes.
/// Returns the names of the columns that were added.
pub async fn ensure_columns(
   db: &SqliteDatabase,
   table: &str,
   columns: &[(&str, &str)],
) -> Result<Vec<String>> {
   let mut writer = db.acquire_writer().await?;

   if !table_exists(&mut writer, table).await? {
      return Err(Error::TableNotFound(table.to_string()));
   }

   let mut known = list_columns(&mut writer, table).await?;
   let mut added = Vec::new();

   for (column, declared_type) in columns {
      if add_column_if_absent(&mut writer, table, column, declared_type, &known).await? {
         known.push(column.to_string());
         added.push(column.to_string());
      }
   }

   writer.release().await?;

   debug!(table = %table, added = ?added, "Ensured columns");
   Ok(added)
}

fn add_column_sql(table: &str, column: &str, declared_type: &str) -> String {
   let declared_type = declared_type.trim();
   if declared_type.is_empty() {
      format!(
         "ALTER TABLE {} ADD COLUMN {} NULL",
         quote_identifier(table),
         quote_identifier(column)
      )
   } else {
      format!(
         "ALTER TABLE {} ADD COLUMN {} {} NULL",
         quote_identifier(table),
         quote_identifier(column),
         declared_type
      )
   }
}

/// Keywords that start a column constraint rather than continue a type name
const CONSTRAINT_KEYWORDS: &[&str] = &[
   "CONSTRAINT",
   "NOT",
   "NULL",
   "PRIMARY",
   "UNIQUE",
   "CHECK",
   "DEFAULT",
   "COLLATE",
   "REFERENCES",
   "GENERATED",
];

/// Declared types are interpolated unquoted, so only plain type names with an
/// optional `(n)` or `(p, s)` size are accepted. An empty type is allowed.
///
/// Constraint clauses are rejected; added columns are always nullable with
/// no default.
fn validate_column_type(declared_type: &str) -> Result<()> {
   static RE: OnceLock<Regex> = OnceLock::new();
   let re = RE.get_or_init(|| {
      Regex::new(r"^(?:[A-Za-z][A-Za-z0-9_ ]*(?:\(\s*[+-]?\d+\s*(?:,\s*[+-]?\d+\s*)?\))?)?$")
         .expect("invalid regex")
   });

   let declared_type = declared_type.trim();
   let has_constraint = declared_type
      .split(|c: char| c.is_whitespace() || c == '(')
      .any(|word| {
         CONSTRAINT_KEYWORDS
            .iter()
            .any(|keyword| word.eq_ignore_ascii_case(keyword))
      });

   if re.is_match(declared_type) && !has_constraint {
      Ok(())
   } else {
      Err(Error::InvalidColumnType {
         declared_type: declared_type.to_string(),
      })
   }
}

/// Quotes a SQLite identifier to prevent SQL injection.
fn quote_identifier(name: &str) -> String {
   // Double any existing double quotes and wrap in double quotes
   format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_quote_identifier() {
      assert_eq!(quote_identifier("users"), "\"users\"");
      assert_eq!(quote_identifier("my table"), "\"my table\"");
      assert_eq!(quote_identifier("foo\"bar"), "\"foo\"\"bar\"");
   }

   #[test]
   fn test_add_column_sql() {
      assert_eq!(
         add_column_sql("users", "age", "INTEGER"),
         "ALTER TABLE \"users\" ADD COLUMN \"age\" INTEGER NULL"
      );
      assert_eq!(
         add_column_sql("users", "misc", ""),
         "ALTER TABLE \"users\" ADD COLUMN \"misc\" NULL"
      );
   }

   #[test]
   fn test_validate_column_type() {
      for ok in [
         "INTEGER",
         "text",
         "VARCHAR(255)",
         "DECIMAL(10, 2)",
         "UNSIGNED BIG INT",
         "NOTE",
         "UNIQUEIDENTIFIER",
         "",
      ] {
         assert!(validate_column_type(ok).is_ok(), "{ok} should be accepted");
      }

      for bad in [
         "TEXT; DROP TABLE users",
         "TEXT DEFAULT 'x'",
         "TEXT NOT NULL",
         "INTEGER PRIMARY KEY",
         "TEXT UNIQUE",
         "text collate nocase",
         "INT CHECK",
         "INTEGER REFERENCES",
         "INT GENERATED",
         "INT)",
         "-- comment",
      ] {
         assert!(validate_column_type(bad).is_err(), "{bad} should be rejected");
      }
   }
}
