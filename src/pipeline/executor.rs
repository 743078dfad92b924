//! Question execution engine.
//!
//! [`QueryPipeline::ask`] walks one question through every [`Stage`] in order.
//! Each gate either advances or ends the request with the error category of the
//! stage that rejected it; nothing is retried. Store and model calls are raced
//! against the request's [`CancellationToken`] and, where configured, a timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::validation::{validate_explanation, validate_question, validate_sql};
use super::{CancellationToken, Stage};
use crate::ai::{LanguageModel, prompts};
use crate::analysis::ColumnAnalyzer;
use crate::config::PipelineConfig;
use crate::error::{QueryError, Result};
use crate::store::{ResultSet, SchemaStore};

/// A question that made it through every gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub sql: String,
    pub result: ResultSet,
    pub explanation: String,
}

/// Successful end states of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Answered(Answer),
    /// The query ran but returned no rows; the explanation stage was skipped
    NoData { sql: String },
}

impl Outcome {
    /// The SQL that was executed.
    pub fn sql(&self) -> &str {
        match self {
            Self::Answered(answer) => &answer.sql,
            Self::NoData { sql } => sql,
        }
    }
}

/// Turns questions about one table into SQL, runs it and explains the result.
pub struct QueryPipeline<S, A, M> {
    store: Arc<S>,
    analyzer: A,
    model: M,
    table: String,
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl<S, A, M> QueryPipeline<S, A, M>
where
    S: SchemaStore,
    A: ColumnAnalyzer,
    M: LanguageModel,
{
    pub fn new(
        store: Arc<S>,
        analyzer: A,
        model: M,
        table: impl Into<String>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            analyzer,
            model,
            table: table.into(),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` to abort in-flight requests.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Answer `question` against the configured table.
    ///
    /// An empty result is a successful [`Outcome::NoData`], not an error.
    ///
    /// # Errors
    ///
    /// `Input`, `Schema`, `Generation`, `Execution`, `TimedOut` or `Cancelled`
    /// when a gate rejects the request; `Model`, `Database` or `CacheIo` when a
    /// collaborator fails.
    pub async fn ask(&self, question: &str) -> Result<Outcome> {
        let outcome = self.run(question).await;
        match &outcome {
            Ok(Outcome::Answered(_)) => tracing::debug!(stage = %Stage::Emit, "answer ready"),
            Ok(Outcome::NoData { sql }) => tracing::info!("Query returned no rows: {sql}"),
            Err(e) if e.is_rejection() => tracing::warn!("Request rejected: {e}"),
            Err(e) => tracing::error!("Request failed: {e}"),
        }
        outcome
    }

    async fn run(&self, question: &str) -> Result<Outcome> {
        tracing::debug!(stage = %Stage::ValidateQuestion, "entering stage");
        let question = validate_question(question, self.config.min_question_len)?;

        let exists = self
            .guard(Stage::TableCheck, None, self.store.table_exists(&self.table))
            .await?;
        if !exists {
            return Err(QueryError::Schema(format!(
                "table '{}' is missing; run `tabletalk load` first",
                self.table
            )));
        }

        let columns = self
            .guard(Stage::Introspect, None, self.store.columns(&self.table))
            .await?;
        let analysis = self
            .guard(Stage::Introspect, None, self.analyzer.analyze(&self.table))
            .await?;

        let prompt = prompts::sql_generation(&self.table, &columns, &analysis, question);
        let reply = self
            .guard(
                Stage::GenerateSql,
                self.config.model_timeout(),
                self.model.complete(&prompt),
            )
            .await?;

        tracing::debug!(stage = %Stage::ValidateSql, "entering stage");
        let sql = validate_sql(&reply, &self.config.sql_prefixes)?;
        tracing::debug!("Generated SQL: {sql}");

        let result = self
            .guard(
                Stage::Execute,
                self.config.query_timeout(),
                self.store.execute_read_only(&sql),
            )
            .await?;

        tracing::debug!(stage = %Stage::ValidateResult, rows = result.len(), "entering stage");
        if result.is_empty() {
            return Ok(Outcome::NoData { sql });
        }

        let preview = result.to_markdown(self.config.preview_rows);
        let prompt = prompts::explanation(&sql, &preview, question);
        let reply = self
            .guard(
                Stage::GenerateExplanation,
                self.config.model_timeout(),
                self.model.complete(&prompt),
            )
            .await?;

        tracing::debug!(stage = %Stage::ValidateExplanation, "entering stage");
        let explanation = validate_explanation(&reply, &self.config.failure_markers)?;

        Ok(Outcome::Answered(Answer {
            sql,
            result,
            explanation,
        }))
    }

    /// Run `work` for `stage`, bounded by `limit` and the cancellation token.
    async fn guard<T>(
        &self,
        stage: Stage,
        limit: Option<Duration>,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tracing::debug!(%stage, "entering stage");
        if self.cancel.is_cancelled() {
            return Err(QueryError::Cancelled(stage));
        }

        let bounded = async {
            match limit {
                Some(after) => tokio::time::timeout(after, work)
                    .await
                    .unwrap_or_else(|_elapsed| Err(QueryError::TimedOut { stage, after })),
                None => work.await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(QueryError::Cancelled(stage)),
            result = bounded => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, ColumnProfile};
    use crate::store::{CellValue, StorageType};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every call so tests can assert which stages ran.
    #[derive(Default)]
    struct FakeStore {
        has_table: bool,
        rows: Vec<Vec<CellValue>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn with_rows(rows: Vec<Vec<CellValue>>) -> Self {
            Self {
                has_table: true,
                rows,
                ..Self::default()
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn called(&self, name: &str) -> bool {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .any(|c| c.starts_with(name))
        }

        fn executed(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter_map(|c| c.strip_prefix("execute:").map(str::to_owned))
                .collect()
        }
    }

    impl SchemaStore for FakeStore {
        async fn tables(&self) -> Result<Vec<String>> {
            self.record("tables");
            Ok(vec!["sales".to_owned()])
        }

        async fn table_exists(&self, _table: &str) -> Result<bool> {
            self.record("table_exists");
            Ok(self.has_table)
        }

        async fn columns(&self, _table: &str) -> Result<Vec<String>> {
            self.record("columns");
            Ok(vec!["region".to_owned(), "amount".to_owned()])
        }

        async fn sample_type(&self, _table: &str, _column: &str) -> Result<StorageType> {
            self.record("sample_type");
            Ok(StorageType::Text)
        }

        async fn distinct_count(&self, _table: &str, _column: &str) -> Result<u64> {
            self.record("distinct_count");
            Ok(0)
        }

        async fn distinct_values(&self, _table: &str, _column: &str) -> Result<Vec<CellValue>> {
            self.record("distinct_values");
            Ok(Vec::new())
        }

        async fn execute_read_only(&self, sql: &str) -> Result<ResultSet> {
            self.record(format!("execute:{sql}"));
            Ok(ResultSet::new(
                vec!["region".to_owned(), "total".to_owned()],
                self.rows.clone(),
            ))
        }
    }

    #[derive(Default)]
    struct FixedAnalyzer {
        calls: Mutex<usize>,
    }

    impl ColumnAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _table: &str) -> Result<AnalysisResult> {
            *self.calls.lock().unwrap() += 1;
            let mut result = AnalysisResult::default();
            result.insert(
                "region",
                ColumnProfile::categorical(["east", "west"].map(String::from)),
            );
            result.insert("amount", ColumnProfile::Numerical);
            Ok(result)
        }
    }

    /// Replies from a script, optionally after a delay.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
                ..Self::default()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new(&["SELECT 1"])
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| QueryError::Model("script exhausted".to_owned()))
        }
    }

    fn sales_rows() -> Vec<Vec<CellValue>> {
        vec![
            vec![CellValue::Text("east".to_owned()), CellValue::Real(1200.5)],
            vec![CellValue::Text("west".to_owned()), CellValue::Real(800.0)],
        ]
    }

    fn pipeline(
        store: FakeStore,
        model: ScriptedModel,
    ) -> QueryPipeline<FakeStore, FixedAnalyzer, ScriptedModel> {
        QueryPipeline::new(
            Arc::new(store),
            FixedAnalyzer::default(),
            model,
            "sales",
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_answer_flows_through_every_stage() -> Result<()> {
        let p = pipeline(
            FakeStore::with_rows(sales_rows()),
            ScriptedModel::new(&[
                "```sql\nSELECT region, SUM(amount) AS total FROM sales GROUP BY region\n```",
                "East leads with 1200.5.",
            ]),
        );

        let outcome = p.ask("  Total amount by region?  ").await?;
        let Outcome::Answered(answer) = outcome else {
            panic!("expected an answer");
        };

        assert_eq!(
            answer.sql,
            "SELECT region, SUM(amount) AS total FROM sales GROUP BY region"
        );
        assert_eq!(answer.result.len(), 2);
        assert_eq!(answer.explanation, "East leads with 1200.5.");
        assert_eq!(p.store.executed(), vec![answer.sql.clone()]);

        let prompts = p.model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("region - east, west"));
        assert!(prompts[0].contains("Question: Total amount by region?"));
        assert!(prompts[1].contains("| east | 1200.5 |"));
        Ok(())
    }

    #[tokio::test]
    async fn test_short_question_never_reaches_table_check() {
        let p = pipeline(FakeStore::with_rows(sales_rows()), ScriptedModel::new(&[]));

        let err = p.ask("abcd").await.err();
        assert!(matches!(err, Some(QueryError::Input(_))));
        assert!(!p.store.called("table_exists"));
    }

    #[tokio::test]
    async fn test_missing_table_never_reaches_introspection() {
        let p = pipeline(FakeStore::default(), ScriptedModel::new(&["SELECT 1"]));

        let err = p.ask("Total amount by region?").await.err();
        assert!(matches!(err, Some(QueryError::Schema(_))));
        assert!(!p.store.called("columns"));
        assert_eq!(*p.analyzer.calls.lock().unwrap(), 0);
        assert!(p.model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_non_select_never_reaches_execute() {
        let p = pipeline(
            FakeStore::with_rows(sales_rows()),
            ScriptedModel::new(&["DROP TABLE sales"]),
        );

        let err = p.ask("Please delete everything").await.err();
        assert!(matches!(err, Some(QueryError::Generation(_))));
        assert!(p.store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_skips_explanation() -> Result<()> {
        let p = pipeline(
            FakeStore::with_rows(Vec::new()),
            ScriptedModel::new(&["SELECT region FROM sales WHERE amount > 1e9", "unused"]),
        );

        let outcome = p.ask("Who earned over a billion?").await?;
        assert_eq!(
            outcome,
            Outcome::NoData {
                sql: "SELECT region FROM sales WHERE amount > 1e9".to_owned()
            }
        );
        assert_eq!(p.model.prompts().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_marker_rejects_explanation() {
        let p = pipeline(
            FakeStore::with_rows(sales_rows()),
            ScriptedModel::new(&["SELECT region FROM sales", "Error: I cannot read this table"]),
        );

        let err = p.ask("Which regions exist?").await.err();
        assert!(matches!(err, Some(QueryError::Generation(_))));
    }

    #[tokio::test]
    async fn test_model_failure_is_model_error() {
        let p = pipeline(FakeStore::with_rows(sales_rows()), ScriptedModel::new(&[]));

        let err = p.ask("Which regions exist?").await.err();
        assert!(matches!(err, Some(QueryError::Model(_))));
        assert!(p.store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let config = PipelineConfig {
            model_timeout_secs: 1,
            ..PipelineConfig::default()
        };
        let p = QueryPipeline::new(
            Arc::new(FakeStore::with_rows(sales_rows())),
            FixedAnalyzer::default(),
            ScriptedModel::slow(Duration::from_secs(60)),
            "sales",
            config,
        );

        let err = p.ask("Which regions exist?").await.err();
        assert!(matches!(
            err,
            Some(QueryError::TimedOut {
                stage: Stage::GenerateSql,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cancel_during_generation() {
        let p = pipeline(
            FakeStore::with_rows(sales_rows()),
            ScriptedModel::slow(Duration::from_secs(60)),
        );
        let token = p.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let err = p.ask("Which regions exist?").await.err();
        assert!(matches!(err, Some(QueryError::Cancelled(Stage::GenerateSql))));
        assert!(p.store.executed().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_table_check() {
        let token = CancellationToken::new();
        token.cancel();
        let p = pipeline(FakeStore::with_rows(sales_rows()), ScriptedModel::new(&[]))
            .with_cancellation(token);

        let err = p.ask("Which regions exist?").await.err();
        assert!(matches!(err, Some(QueryError::Cancelled(Stage::TableCheck))));
        assert!(!p.store.called("table_exists"));
    }
}
