/// Result type alias for toolkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SQLite toolkit operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection manager.
   #[error(transparent)]
   ConnectionManager(#[from] sqlx_sqlite_conn_mgr::Error),

   /// Declared column type contains characters that cannot be interpolated.
   ///
   /// Types must look like `INTEGER`, `TEXT`, `VARCHAR(255)` or
   /// `DECIMAL(10, 2)`.
   #[error("invalid declared column type '{declared_type}'")]
   InvalidColumnType { declared_type: String },

   /// Table to migrate does not exist.
   #[error("table not found: {0}")]
   TableNotFound(String),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::ConnectionManager(sqlx_sqlite_conn_mgr::Error::DatabaseClosed) => {
            "DATABASE_CLOSED".to_string()
         }
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::InvalidColumnType { .. } => "INVALID_COLUMN_TYPE".to_string(),
         Error::TableNotFound(_) => "TABLE_NOT_FOUND".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_sqlx_non_database() {
      // RowNotFound is not a database error, so no SQLite code
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
   }

   #[test]
   fn test_error_code_database_closed() {
      let err = Error::ConnectionManager(sqlx_sqlite_conn_mgr::Error::DatabaseClosed);
      assert_eq!(err.error_code(), "DATABASE_CLOSED");
   }

   #[test]
   fn test_error_code_connection_io() {
      let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
      let err = Error::ConnectionManager(sqlx_sqlite_conn_mgr::Error::Io(io));
      assert_eq!(err.error_code(), "CONNECTION_ERROR");
   }

   #[test]
   fn test_error_code_invalid_column_type() {
      let err = Error::InvalidColumnType {
         declared_type: "TEXT; DROP TABLE users".into(),
      };
      assert_eq!(err.error_code(), "INVALID_COLUMN_TYPE");
      assert!(err.to_string().contains("DROP TABLE"));
   }

   #[test]
   fn test_error_code_table_not_found() {
      let err = Error::TableNotFound("users".into());
      assert_eq!(err.error_code(), "TABLE_NOT_FOUND");
      assert!(err.to_string().contains("users"));
   }
}
