use serde::{Serialize, Serializer};

/// Errors returned by the store registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from the connection manager.
   #[error(transparent)]
   ConnectionManager(#[from] sqlx_sqlite_conn_mgr::Error),

   /// Error from the schema helpers.
   #[error(transparent)]
   Toolkit(#[from] sqlx_sqlite_toolkit::Error),

   /// No store is registered under the path.
   #[error("store not loaded: {0}")]
   StoreNotLoaded(String),
}

impl Error {
   /// Stable code for callers that match on error kinds rather than messages.
   pub fn error_code(&self) -> String {
      match self {
         Error::ConnectionManager(sqlx_sqlite_conn_mgr::Error::DatabaseClosed) => {
            "DATABASE_CLOSED".to_string()
         }
         Error::ConnectionManager(sqlx_sqlite_conn_mgr::Error::WriteTimeout(_)) => {
            "WRITE_TIMEOUT".to_string()
         }
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::Toolkit(e) => e.error_code(),
         Error::StoreNotLoaded(_) => "STORE_NOT_LOADED".to_string(),
      }
   }
}

/// Serialized as `{ code, message }` so hosts can forward errors as-is.
impl Serialize for Error {
   fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
   where
      S: Serializer,
   {
      use serde::ser::SerializeStruct;

      let mut state = serializer.serialize_struct("Error", 2)?;
      state.serialize_field("code", &self.error_code())?;
      state.serialize_field("message", &self.to_string())?;
      state.end()
   }
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_codes() {
      let closed = Error::from(sqlx_sqlite_conn_mgr::Error::DatabaseClosed);
      assert_eq!(closed.error_code(), "DATABASE_CLOSED");

      let timeout = Error::from(sqlx_sqlite_conn_mgr::Error::WriteTimeout(
         std::time::Duration::from_millis(10),
      ));
      assert_eq!(timeout.error_code(), "WRITE_TIMEOUT");

      let missing = Error::StoreNotLoaded("a.db".into());
      assert_eq!(missing.error_code(), "STORE_NOT_LOADED");
      assert_eq!(missing.to_string(), "store not loaded: a.db");
   }

   #[test]
   fn test_serializes_code_and_message() {
      let err = Error::StoreNotLoaded("notes.db".into());
      let json = serde_json::to_value(&err).unwrap();

      assert_eq!(json["code"], "STORE_NOT_LOADED");
      assert_eq!(json["message"], "store not loaded: notes.db");
   }
}
