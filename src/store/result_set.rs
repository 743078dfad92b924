//! Rows returned by the store, and their two renderings: a markdown preview for
//! the explanation prompt and an aligned text table for the terminal.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            // Debug keeps the fractional part of whole floats ("2.0", not "2")
            Self::Real(v) => write!(f, "{v:?}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Blob(bytes) => {
                write!(f, "x'")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                write!(f, "'")
            }
        }
    }
}

/// Column names plus rows, in the order the store produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Markdown table of the first `limit` rows.
    pub fn to_markdown(&self, limit: usize) -> String {
        let escape = |s: String| s.replace('|', "\\|").replace('\n', " ");

        let mut out = String::new();
        out.push_str("| ");
        out.push_str(
            &self
                .columns
                .iter()
                .map(|c| escape(c.clone()))
                .collect::<Vec<_>>()
                .join(" | "),
        );
        out.push_str(" |\n|");
        out.push_str(&vec!["---"; self.columns.len()].join("|"));
        out.push_str("|\n");

        for row in self.rows.iter().take(limit) {
            let cells: Vec<String> = row.iter().map(|v| escape(v.to_string())).collect();
            out.push_str("| ");
            out.push_str(&cells.join(" | "));
            out.push_str(" |\n");
        }
        out
    }

    /// Plain-text table with right-aligned columns and no index.
    pub fn render_table(&self) -> String {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                rendered
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = vec![format_line(self.columns.iter(), &widths)];
        for row in &rendered {
            lines.push(format_line(row.iter(), &widths));
        }
        lines.join("\n")
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join(" ")
}
