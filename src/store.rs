//! Backing relational store.
//!
//! The pipeline and the classifier only see the [`SchemaStore`] trait. The
//! production implementation is [`SqliteStore`], which opens a fresh connection
//! for every operation; no transaction spans two calls.

use std::future::Future;

use crate::error::Result;

pub mod ingest;
pub mod result_set;
pub mod sqlite;

pub use result_set::{CellValue, ResultSet};
pub use sqlite::SqliteStore;

/// Storage class of a sampled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Text,
    Numeric,
    /// No non-null value exists to sample
    Null,
}

impl StorageType {
    /// Map a SQLite `typeof()` result onto the closed set of storage types.
    /// Blobs count as text: they are labels, not quantities.
    pub fn from_sqlite_typeof(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "text" | "blob" => Self::Text,
            "integer" | "real" => Self::Numeric,
            _ => Self::Null,
        }
    }
}

/// Introspection and read access to the tables questions are asked against.
pub trait SchemaStore: Send + Sync {
    /// Names of all user tables.
    fn tables(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn table_exists(&self, table: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Column names in declaration order. Fails with `Schema` for an unknown table.
    fn columns(&self, table: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Storage type of one non-null value of `column`, or `Null` if there is none.
    fn sample_type(
        &self,
        table: &str,
        column: &str,
    ) -> impl Future<Output = Result<StorageType>> + Send;

    /// Number of distinct non-null values in `column`.
    fn distinct_count(&self, table: &str, column: &str)
    -> impl Future<Output = Result<u64>> + Send;

    /// Distinct non-null values of `column`, in no particular order.
    fn distinct_values(
        &self,
        table: &str,
        column: &str,
    ) -> impl Future<Output = Result<Vec<CellValue>>> + Send;

    /// Run an arbitrary statement on a read-only connection.
    /// Store rejections are reported as `Execution` errors.
    fn execute_read_only(&self, sql: &str) -> impl Future<Output = Result<ResultSet>> + Send;
}
