//! Type sniffing plus a distinct-count threshold decides each column's profile.

use std::sync::Arc;

use super::{AnalysisResult, ColumnAnalyzer, ColumnProfile};
use crate::error::Result;
use crate::store::{SchemaStore, StorageType};

pub struct ColumnClassifier<S> {
    store: Arc<S>,
    threshold: u64,
}

impl<S: SchemaStore> ColumnClassifier<S> {
    /// `threshold` is the largest distinct count a numeric column may have and
    /// still be treated as categorical.
    pub fn new(store: Arc<S>, threshold: u64) -> Self {
        Self { store, threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Classify every column of `table`, in declaration order.
    ///
    /// # Errors
    ///
    /// `Schema` if the table does not exist; store errors otherwise.
    pub async fn classify(&self, table: &str) -> Result<AnalysisResult> {
        let columns = self.store.columns(table).await?;

        let mut result = AnalysisResult::default();
        for column in &columns {
            let profile = self.classify_column(table, column).await?;
            tracing::debug!(table, column = column.as_str(), ?profile, "classified column");
            result.insert(column.as_str(), profile);
        }

        debug_assert!(result.covers(&columns), "classification must partition the columns");
        Ok(result)
    }

    async fn classify_column(&self, table: &str, column: &str) -> Result<ColumnProfile> {
        let categorical = match self.store.sample_type(table, column).await? {
            StorageType::Text => true,
            StorageType::Numeric => self.store.distinct_count(table, column).await? <= self.threshold,
            // Nothing to enumerate: an empty label set, never numerical
            StorageType::Null => return Ok(ColumnProfile::Categorical(Vec::new())),
        };

        if !categorical {
            return Ok(ColumnProfile::Numerical);
        }

        let values = self.store.distinct_values(table, column).await?;
        Ok(ColumnProfile::categorical(
            values.iter().map(ToString::to_string),
        ))
    }
}

impl<S: SchemaStore> ColumnAnalyzer for ColumnClassifier<S> {
    async fn analyze(&self, table: &str) -> Result<AnalysisResult> {
        self.classify(table).await
    }
}
