//! The question-answering state machine.
//!
//! A question moves through a fixed sequence of [`Stage`]s:
//!
//! 1. **ValidateQuestion**: non-empty and long enough after trimming
//! 2. **TableCheck**: the target table exists
//! 3. **Introspect**: column names plus the (cached) column analysis
//! 4. **GenerateSql** / **ValidateSql**: the model writes SQL; fences are
//!    stripped and the statement must start with an allowed keyword
//! 5. **Execute**: the SQL runs on a read-only connection
//! 6. **ValidateResult**: zero rows ends the request with [`Outcome::NoData`]
//! 7. **GenerateExplanation** / **ValidateExplanation**: the model explains
//!    the first rows; replies containing a failure marker are rejected
//! 8. **Emit**: SQL, result and explanation are returned as an [`Answer`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tabletalk::ai::OpenAiModel;
//! use tabletalk::analysis::{AnalysisCache, ColumnClassifier};
//! use tabletalk::config::Settings;
//! use tabletalk::pipeline::{Outcome, QueryPipeline};
//! use tabletalk::store::SqliteStore;
//!
//! # async fn demo() -> tabletalk::error::Result<()> {
//! let settings = Settings::default();
//! let store = Arc::new(SqliteStore::new(&settings.database.path));
//! let classifier = ColumnClassifier::new(Arc::clone(&store), settings.analysis.categorical_threshold);
//! let analyzer = AnalysisCache::new(classifier, &settings.database.path, &settings.analysis.cache_dir)?;
//! let model = OpenAiModel::new(&settings.llm);
//!
//! let pipeline = QueryPipeline::new(store, analyzer, model, &settings.database.table, settings.pipeline.clone());
//! if let Outcome::Answered(answer) = pipeline.ask("Which region earns the most?").await? {
//!     println!("{}", answer.explanation);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod executor;
pub mod stage;
pub mod validation;

pub use cancel::CancellationToken;
pub use executor::{Answer, Outcome, QueryPipeline};
pub use stage::Stage;
pub use validation::{strip_code_fence, validate_explanation, validate_question, validate_sql};
