//! One-shot CSV bulk load into the backing store.

use polars::prelude::*;
use sqlx::Connection as _;
use std::path::Path;

use super::SqliteStore;
use crate::error::{QueryError, Result};
use crate::utils::quote_identifier;

/// A polars value converted to something SQLite can bind.
#[derive(Debug, Clone, PartialEq)]
enum SqlParam {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl From<AnyValue<'_>> for SqlParam {
    fn from(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Self::Null,
            AnyValue::Boolean(b) => Self::Int(i64::from(b)),
            AnyValue::Int8(v) => Self::Int(i64::from(v)),
            AnyValue::Int16(v) => Self::Int(i64::from(v)),
            AnyValue::Int32(v) => Self::Int(i64::from(v)),
            AnyValue::Int64(v) => Self::Int(v),
            AnyValue::UInt8(v) => Self::Int(i64::from(v)),
            AnyValue::UInt16(v) => Self::Int(i64::from(v)),
            AnyValue::UInt32(v) => Self::Int(i64::from(v)),
            AnyValue::UInt64(v) => i64::try_from(v).map_or_else(|_| Self::Text(v.to_string()), Self::Int),
            AnyValue::Float32(v) => Self::Real(f64::from(v)),
            AnyValue::Float64(v) => Self::Real(v),
            AnyValue::String(s) => Self::Text(s.to_owned()),
            AnyValue::StringOwned(s) => Self::Text(s.to_string()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// SQLite column affinity for a polars dtype.
fn sql_type(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "INTEGER",
        DataType::Float32 | DataType::Float64 => "REAL",
        _ => "TEXT",
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(QueryError::Ingest(format!("CSV file {} not found", path.display())));
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10_000))
        .with_has_header(true)
        .finish()?
        .collect()?;
    Ok(df)
}

/// Replace `table` with the contents of the CSV at `csv_path`.
///
/// The drop, create and every insert run in one transaction, so a failed load
/// leaves the previous table in place.
///
/// # Errors
///
/// `Ingest` when the CSV cannot be read, `Database` when the store rejects the load.
pub async fn load_csv(store: &SqliteStore, csv_path: &Path, table: &str) -> Result<usize> {
    let df = read_csv(csv_path)?;
    let quoted_table = quote_identifier(table);

    let schema = df.schema();
    let column_definitions: Vec<String> = schema
        .iter()
        .map(|(name, dtype)| format!("{} {}", quote_identifier(name), sql_type(dtype)))
        .collect();

    let create_table = format!(
        "CREATE TABLE {quoted_table} ({})",
        column_definitions.join(", ")
    );
    let insert = format!(
        "INSERT INTO {quoted_table} VALUES ({})",
        vec!["?"; df.width()].join(", ")
    );

    let mut conn = store.connect_writable().await?;
    let mut tx = conn.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {quoted_table}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&create_table)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::Database(format!("Failed to create table {quoted_table}: {e}")))?;

    let columns: Vec<&Series> = df
        .get_columns()
        .iter()
        .map(Column::as_materialized_series)
        .collect();

    for row_idx in 0..df.height() {
        let mut query = sqlx::query(&insert);
        for series in &columns {
            query = match SqlParam::from(series.get(row_idx)?) {
                SqlParam::Null => query.bind(None::<String>),
                SqlParam::Int(v) => query.bind(v),
                SqlParam::Real(v) => query.bind(v),
                SqlParam::Text(s) => query.bind(s),
            };
        }
        query.execute(&mut *tx).await?;
    }

    tx.commit().await?;
    conn.close().await?;

    tracing::info!(
        "Loaded {} rows into {quoted_table} from {}",
        df.height(),
        csv_path.display()
    );
    Ok(df.height())
}
