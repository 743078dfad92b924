//! Column analysis: which columns are label sets and which are quantities.
//!
//! [`ColumnClassifier`] computes an [`AnalysisResult`] from the store;
//! [`AnalysisCache`] wraps any [`ColumnAnalyzer`] and persists its results next to
//! the data, invalidated by the source file's modification time.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tabletalk::analysis::{AnalysisCache, ColumnAnalyzer as _, ColumnClassifier};
//! use tabletalk::store::SqliteStore;
//!
//! # async fn example() -> tabletalk::error::Result<()> {
//! let store = Arc::new(SqliteStore::new("sales.db"));
//! let classifier = ColumnClassifier::new(Arc::clone(&store), 20);
//! let cache = AnalysisCache::new(classifier, store.path(), ".cache")?;
//!
//! let analysis = cache.analyze("sales").await?;
//! println!("numerical: {:?}", analysis.numerical);
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use crate::error::Result;

pub mod cache;
pub mod classifier;
pub mod model;

pub use cache::{AnalysisCache, cache_file_name};
pub use classifier::ColumnClassifier;
pub use model::{AnalysisResult, ColumnProfile};

/// Anything that can produce an [`AnalysisResult`] for a table.
pub trait ColumnAnalyzer: Send + Sync {
    fn analyze(&self, table: &str) -> impl Future<Output = Result<AnalysisResult>> + Send;
}
