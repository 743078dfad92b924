//! CSV ingestion into SQLite and classification of the loaded table.

mod support;

use std::sync::Arc;

use support::{TABLE, loaded_store, sales_csv};
use tabletalk::analysis::ColumnClassifier;
use tabletalk::error::QueryError;
use tabletalk::store::{CellValue, SchemaStore as _, SqliteStore, ingest};

#[tokio::test]
async fn test_load_creates_table_with_csv_columns() {
    let dir = tempfile::tempdir().unwrap();
    let store = loaded_store(dir.path()).await;

    assert!(store.table_exists(TABLE).await.unwrap());
    assert_eq!(store.tables().await.unwrap(), vec![TABLE.to_owned()]);
    assert_eq!(
        store.columns(TABLE).await.unwrap(),
        vec!["region", "channel", "amount", "units"]
    );
}

#[tokio::test]
async fn test_reload_replaces_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = loaded_store(dir.path()).await;

    let rows = ingest::load_csv(&store, &sales_csv(), TABLE).await.unwrap();
    assert_eq!(rows, 50);

    let count = store
        .execute_read_only("SELECT COUNT(*) AS n FROM sales")
        .await
        .unwrap();
    assert_eq!(count.rows(), &[vec![CellValue::Integer(50)]]);
}

#[tokio::test]
async fn test_missing_csv_is_ingest_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("sales.db"));

    let err = ingest::load_csv(&store, &dir.path().join("nope.csv"), TABLE)
        .await
        .err();
    assert!(matches!(err, Some(QueryError::Ingest(_))));
}

#[tokio::test]
async fn test_classify_loaded_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(loaded_store(dir.path()).await);

    let analysis = ColumnClassifier::new(store, 20).classify(TABLE).await.unwrap();

    assert_eq!(analysis.categorical["region"], vec!["east", "north", "west"]);
    assert_eq!(analysis.categorical["channel"], vec!["store", "web"]);
    assert_eq!(analysis.categorical["units"], vec!["1", "2", "3", "4", "5"]);
    assert_eq!(analysis.numerical, vec!["amount"]);
    assert!(analysis.covers(&[
        "region".to_owned(),
        "channel".to_owned(),
        "amount".to_owned(),
        "units".to_owned(),
    ]));
}

#[tokio::test]
async fn test_unknown_table_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = loaded_store(dir.path()).await;

    assert!(!store.table_exists("returns").await.unwrap());
    assert!(matches!(
        store.columns("returns").await.err(),
        Some(QueryError::Schema(_))
    ));
}
