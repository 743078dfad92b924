//! Prompt templates for SQL generation and result explanation.

use crate::analysis::AnalysisResult;

/// Prompt asking for a single SQLite `SELECT` answering `question`.
pub fn sql_generation(
    table: &str,
    columns: &[String],
    analysis: &AnalysisResult,
    question: &str,
) -> String {
    let categorical = analysis.categorical_summary();
    let categorical = if categorical.is_empty() { "(none)".to_owned() } else { categorical };
    let numerical = analysis.numerical_summary();
    let numerical = if numerical.is_empty() { "(none)".to_owned() } else { numerical };

    format!(
        r#"You are an expert SQLite analyst. Write one SQLite query that answers the question below.

Table: {table}
Columns: {columns}

Categorical columns and every value they take:
{categorical}

Numerical columns:
{numerical}

Rules:
- Answer with a single SELECT statement and nothing else: no explanation, no comments.
- Use only the table and columns listed above; quote column names that contain spaces with double quotes.
- Compare categorical columns only against the listed values, spelled exactly as shown.
- Never modify data.

Question: {question}
SQL:"#,
        columns = columns.join(", "),
    )
}

/// Prompt asking for a plain-language answer grounded in `result_preview`.
pub fn explanation(sql: &str, result_preview: &str, question: &str) -> String {
    format!(
        r#"A user asked a question about a dataset. The following SQL query was run to answer it.

Question: {question}

SQL:
{sql}

Result (first rows, markdown):
{result_preview}

Answer the question in two or three plain sentences using only the numbers in the result.
Do not describe the SQL. If the result does not answer the question, say that you can't interpret it."#
    )
}
