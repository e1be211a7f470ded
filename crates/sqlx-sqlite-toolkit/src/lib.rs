//! # sqlx-sqlite-toolkit
//!
//! Helpers built on [`sqlx_sqlite_conn_mgr`] for bringing a store's schema up
//! to date when it opens.
//!
//! - [`table_exists`] / [`list_columns`] / [`table_columns`]: introspection
//! - [`add_column_if_absent`]: additive, nullable column migration
//! - [`ensure_columns`]: the two combined on the database's writer

mod error;
pub mod schema;

pub use error::{Error, Result};
pub use schema::{
   ColumnDescriptor, add_column_if_absent, ensure_columns, list_columns, table_columns,
   table_exists,
};
