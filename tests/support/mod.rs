#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sqlx::Connection as _;
use sqlx::SqliteConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use tabletalk::ai::LanguageModel;
use tabletalk::error::{QueryError, Result};
use tabletalk::store::{SqliteStore, ingest};

pub(crate) const TABLE: &str = "sales";

/// 50 rows: `region` (east/north/west), `channel` (store/web), `amount`
/// (50 distinct decimals), `units` (1 to 5).
pub(crate) fn sales_csv() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/sales.csv")
}

/// A fresh `sales.db` in `dir` loaded from the fixture CSV.
pub(crate) async fn loaded_store(dir: &Path) -> SqliteStore {
    let store = SqliteStore::new(dir.join("sales.db"));
    ingest::load_csv(&store, &sales_csv(), TABLE)
        .await
        .expect("fixture CSV should load");
    store
}

/// Run a mutating statement outside the store's read-only paths.
pub(crate) async fn execute_write(db: &Path, sql: &str) {
    let options = SqliteConnectOptions::new()
        .filename(db)
        .journal_mode(SqliteJournalMode::Delete);
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .expect("test database should open");
    sqlx::query(sql)
        .execute(&mut conn)
        .await
        .expect("test statement should run");
    conn.close().await.expect("test connection should close");
}

/// Answers prompts from a fixed script and keeps every prompt it was sent.
#[derive(Default)]
pub(crate) struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub(crate) fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
            prompts: Mutex::default(),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_owned());
        self.replies
            .lock()
            .expect("script poisoned")
            .pop_front()
            .ok_or_else(|| QueryError::Model("script exhausted".to_owned()))
    }
}
