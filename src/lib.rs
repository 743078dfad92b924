//! # tabletalk - ask questions of a table in plain language
//!
//! tabletalk turns a natural-language question about a single SQLite table into
//! a SQL query (written by a language model), runs it read-only, and has the
//! model explain the result.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tabletalk::ai::OpenAiModel;
//! use tabletalk::analysis::{AnalysisCache, ColumnClassifier};
//! use tabletalk::config::Settings;
//! use tabletalk::pipeline::{Outcome, QueryPipeline};
//! use tabletalk::store::{SqliteStore, ingest};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::load(None)?;
//! let store = Arc::new(SqliteStore::new(&settings.database.path));
//! ingest::load_csv(&store, &settings.database.csv_path, &settings.database.table).await?;
//!
//! let classifier = ColumnClassifier::new(Arc::clone(&store), settings.analysis.categorical_threshold);
//! let analyzer = AnalysisCache::new(classifier, store.path(), &settings.analysis.cache_dir)?;
//! let pipeline = QueryPipeline::new(
//!     store,
//!     analyzer,
//!     OpenAiModel::new(&settings.llm),
//!     &settings.database.table,
//!     settings.pipeline.clone(),
//! );
//!
//! match pipeline.ask("What is the average hourly rate per platform?").await? {
//!     Outcome::Answered(answer) => println!("{}", answer.explanation),
//!     Outcome::NoData { sql } => println!("No rows for {sql}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`pipeline`]: the staged question-answering state machine
//! - [`analysis`]: categorical/numerical column classification and its file cache
//! - [`store`]: the SQLite backing store, CSV ingestion and result sets
//! - [`ai`]: the language-model client and prompt templates
//! - [`config`]: JSON settings with defaults
//! - [`error`]: the [`error::QueryError`] taxonomy
//! - [`logging`]: `tracing` subscriber setup

pub mod ai;
pub mod analysis;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod store;
pub mod utils;
