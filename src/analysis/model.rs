use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// How one column is presented to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnProfile {
    /// Finite label set; values sorted and deduplicated
    Categorical(Vec<String>),
    /// Continuous or ordinal range, not enumerated
    Numerical,
}

impl ColumnProfile {
    /// Build a categorical profile from raw values, normalizing their order.
    pub fn categorical(values: impl IntoIterator<Item = String>) -> Self {
        let mut values: Vec<String> = values.into_iter().collect();
        values.sort();
        values.dedup();
        Self::Categorical(values)
    }
}

/// Partition of a table's columns into categorical and numerical.
///
/// This is also the on-disk cache format. `categorical` is a `BTreeMap` so the
/// serialized keys are always sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub categorical: BTreeMap<String, Vec<String>>,
    pub numerical: Vec<String>,
}

impl AnalysisResult {
    pub fn insert(&mut self, column: impl Into<String>, profile: ColumnProfile) {
        let column = column.into();
        match profile {
            ColumnProfile::Categorical(values) => {
                self.categorical.insert(column, values);
            }
            ColumnProfile::Numerical => self.numerical.push(column),
        }
    }

    pub fn profile(&self, column: &str) -> Option<ColumnProfile> {
        if let Some(values) = self.categorical.get(column) {
            return Some(ColumnProfile::Categorical(values.clone()));
        }
        self.numerical
            .iter()
            .any(|c| c == column)
            .then_some(ColumnProfile::Numerical)
    }

    pub fn column_count(&self) -> usize {
        self.categorical.len() + self.numerical.len()
    }

    /// No column is listed twice and every value list is strictly ascending.
    pub fn is_well_formed(&self) -> bool {
        let mut seen: HashSet<&str> = self.categorical.keys().map(String::as_str).collect();
        let numerical_unique = self.numerical.iter().all(|c| seen.insert(c.as_str()));

        numerical_unique
            && self
                .categorical
                .values()
                .all(|values| values.windows(2).all(|w| w[0] < w[1]))
    }

    /// Whether this result partitions exactly `columns`.
    pub fn covers(&self, columns: &[String]) -> bool {
        self.is_well_formed()
            && self.column_count() == columns.len()
            && columns.iter().all(|c| self.profile(c).is_some())
    }

    /// One `column - v1, v2, ...` line per categorical column.
    pub fn categorical_summary(&self) -> String {
        self.categorical
            .iter()
            .map(|(column, values)| format!("{column} - {}", values.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn numerical_summary(&self) -> String {
        self.numerical.join(", ")
    }
}
