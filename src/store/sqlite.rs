use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteRow};
use sqlx::{Column as _, Connection as _, Row as _, SqliteConnection, TypeInfo as _, ValueRef as _};
use std::path::{Path, PathBuf};

use super::{CellValue, ResultSet, SchemaStore, StorageType};
use crate::error::{QueryError, Result};
use crate::utils::quote_identifier;

/// SQLite-backed store. Every operation opens its own connection and closes it
/// before returning.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The database file. Its modification time drives analysis cache staleness.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-write connection, creating the file if needed. The rollback journal
    /// keeps every committed write in the main file, so its mtime stays accurate.
    pub(crate) async fn connect_writable(&self) -> Result<SqliteConnection> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);

        SqliteConnection::connect_with(&options).await.map_err(|e| {
            QueryError::Database(format!("Failed to open {}: {e}", self.path.display()))
        })
    }

    async fn connect_read_only(&self) -> Result<SqliteConnection> {
        if !self.path.exists() {
            return Err(QueryError::Database(format!(
                "Database file {} does not exist",
                self.path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true);

        SqliteConnection::connect_with(&options).await.map_err(|e| {
            QueryError::Database(format!("Failed to open {}: {e}", self.path.display()))
        })
    }
}

impl SchemaStore for SqliteStore {
    async fn tables(&self) -> Result<Vec<String>> {
        let mut conn = self.connect_read_only().await?;
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;
        Ok(tables)
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        // An absent file simply has no tables yet
        if !self.path.exists() {
            return Ok(false);
        }

        let mut conn = self.connect_read_only().await?;
        let found = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_optional(&mut conn)
        .await?;
        conn.close().await?;
        Ok(found.is_some())
    }

    async fn columns(&self, table: &str) -> Result<Vec<String>> {
        let mut conn = self.connect_read_only().await?;
        let columns = sqlx::query_scalar::<_, String>(
            "SELECT name FROM pragma_table_info(?) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;

        if columns.is_empty() {
            return Err(QueryError::Schema(format!("table '{table}' not found")));
        }
        Ok(columns)
    }

    async fn sample_type(&self, table: &str, column: &str) -> Result<StorageType> {
        let (t, c) = (quote_identifier(table), quote_identifier(column));
        let sql = format!("SELECT typeof({c}) FROM {t} WHERE {c} IS NOT NULL LIMIT 1");

        let mut conn = self.connect_read_only().await?;
        let tag = sqlx::query_scalar::<_, String>(&sql)
            .fetch_optional(&mut conn)
            .await?;
        conn.close().await?;

        Ok(tag.map_or(StorageType::Null, |t| StorageType::from_sqlite_typeof(&t)))
    }

    async fn distinct_count(&self, table: &str, column: &str) -> Result<u64> {
        let (t, c) = (quote_identifier(table), quote_identifier(column));
        let sql = format!("SELECT COUNT(DISTINCT {c}) FROM {t}");

        let mut conn = self.connect_read_only().await?;
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;

        u64::try_from(count)
            .map_err(|_negative| QueryError::Database(format!("negative distinct count {count}")))
    }

    async fn distinct_values(&self, table: &str, column: &str) -> Result<Vec<CellValue>> {
        let (t, c) = (quote_identifier(table), quote_identifier(column));
        let sql = format!("SELECT DISTINCT {c} FROM {t} WHERE {c} IS NOT NULL");

        let mut conn = self.connect_read_only().await?;
        let rows = sqlx::query(&sql).fetch_all(&mut conn).await?;
        conn.close().await?;

        rows.iter()
            .map(|row| decode_cell(row, 0).map_err(QueryError::from))
            .collect()
    }

    async fn execute_read_only(&self, sql: &str) -> Result<ResultSet> {
        let mut conn = self.connect_read_only().await?;
        let rows = sqlx::query(sql)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?;
        conn.close().await?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_owned()).collect())
            .unwrap_or_default();

        let values = rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|idx| decode_cell(row, idx))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| QueryError::Execution(format!("Failed to decode result row: {e}")))?;

        Ok(ResultSet::new(columns, values))
    }
}

/// Decode one cell by the storage class of the value itself, not the declared
/// column type: SQLite lets any column hold any class.
fn decode_cell(row: &SqliteRow, idx: usize) -> std::result::Result<CellValue, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(CellValue::Null);
    }
    let type_name = raw.type_info().name().to_owned();

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => CellValue::Integer(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" | "NUMERIC" => CellValue::Real(row.try_get_unchecked::<f64, _>(idx)?),
        "BLOB" => CellValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => CellValue::Text(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn seeded_store() -> anyhow::Result<(TempDir, SqliteStore)> {
        let dir = tempfile::tempdir()?;
        let store = SqliteStore::new(dir.path().join("sales.db"));

        let mut conn = store.connect_writable().await?;
        sqlx::query("CREATE TABLE sales (region TEXT, amount REAL, units INTEGER, note TEXT)")
            .execute(&mut conn)
            .await?;
        sqlx::query(
            "INSERT INTO sales VALUES ('east', 10.5, 1, NULL), ('west', 20.0, 2, NULL), ('east', 7.25, 1, NULL)",
        )
        .execute(&mut conn)
        .await?;
        conn.close().await?;

        Ok((dir, store))
    }

    #[tokio::test]
    async fn test_introspection() -> anyhow::Result<()> {
        let (_dir, store) = seeded_store().await?;

        assert_eq!(store.tables().await?, vec!["sales".to_owned()]);
        assert!(store.table_exists("sales").await?);
        assert!(!store.table_exists("missing").await?);
        assert_eq!(
            store.columns("sales").await?,
            vec!["region", "amount", "units", "note"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_columns_of_missing_table_is_schema_error() -> anyhow::Result<()> {
        let (_dir, store) = seeded_store().await?;
        let err = store.columns("missing").await.err();
        assert!(matches!(err, Some(QueryError::Schema(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_has_no_tables() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SqliteStore::new(dir.path().join("absent.db"));
        assert!(!store.table_exists("sales").await?);
        assert!(!store.path().exists(), "lookup must not create the file");
        Ok(())
    }

    #[tokio::test]
    async fn test_sampling_and_counts() -> anyhow::Result<()> {
        let (_dir, store) = seeded_store().await?;

        assert_eq!(store.sample_type("sales", "region").await?, StorageType::Text);
        assert_eq!(store.sample_type("sales", "amount").await?, StorageType::Numeric);
        assert_eq!(store.sample_type("sales", "note").await?, StorageType::Null);
        assert_eq!(store.distinct_count("sales", "region").await?, 2);
        assert_eq!(store.distinct_count("sales", "note").await?, 0);

        let mut units = store.distinct_values("sales", "units").await?;
        units.sort_by_key(ToString::to_string);
        assert_eq!(units, vec![CellValue::Integer(1), CellValue::Integer(2)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_execute_decodes_value_classes() -> anyhow::Result<()> {
        let (_dir, store) = seeded_store().await?;

        let rs = store
            .execute_read_only(
                "SELECT region, SUM(amount) AS total, COUNT(*) AS n FROM sales GROUP BY region ORDER BY region",
            )
            .await?;
        assert_eq!(rs.columns(), ["region", "total", "n"]);
        assert_eq!(
            rs.rows()[0],
            vec![
                CellValue::Text("east".to_owned()),
                CellValue::Real(17.75),
                CellValue::Integer(2)
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_execute_is_read_only() -> anyhow::Result<()> {
        let (_dir, store) = seeded_store().await?;

        let err = store.execute_read_only("DELETE FROM sales").await.err();
        assert!(matches!(err, Some(QueryError::Execution(_))));
        assert_eq!(store.execute_read_only("SELECT * FROM sales").await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_sql_is_execution_error() -> anyhow::Result<()> {
        let (_dir, store) = seeded_store().await?;
        let err = store.execute_read_only("SELECT nope FROM sales").await.err();
        assert!(matches!(err, Some(QueryError::Execution(_))));
        Ok(())
    }
}
