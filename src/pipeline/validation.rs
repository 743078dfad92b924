//! Gate checks between pipeline stages.
//!
//! Each gate either hands a cleaned value to the next stage or rejects the
//! request with the error category that stage owns.

use crate::error::{QueryError, Result};

const FENCE: &str = "```";

/// Trim `question` and require at least `min_len` characters.
pub fn validate_question(question: &str, min_len: usize) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(QueryError::Input("question rejected: it is empty".to_owned()));
    }
    if trimmed.chars().count() < min_len {
        return Err(QueryError::Input(format!(
            "question rejected: it must be at least {min_len} characters"
        )));
    }
    Ok(trimmed)
}

/// Remove one surrounding markdown code fence, if present.
///
/// A fenced block is an opening ```` ``` ```` with an optional info string on
/// the same line, followed by the body up to the closing fence. Only a single
/// word counts as an info string; anything longer on the opening line is the
/// first line of the body. A missing closing fence takes the rest of the text.
/// Unfenced text is only trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    match rest.split_once('\n') {
        // `sql`, `sqlite` or nothing at all
        Some((info, body)) if is_info_string(info) => until_fence(body),
        _ => strip_sql_tag(until_fence(rest)),
    }
}

fn is_info_string(line: &str) -> bool {
    let line = line.trim();
    !line.contains(char::is_whitespace) && !line.contains(FENCE)
}

/// `text` up to the first fence, trimmed.
fn until_fence(text: &str) -> &str {
    text.find(FENCE).map_or(text, |end| &text[..end]).trim()
}

/// A tag followed by SQL on the opening line: ```` ```sql SELECT 1``` ````.
fn strip_sql_tag(inner: &str) -> &str {
    match inner.get(..3) {
        Some(tag) if tag.eq_ignore_ascii_case("sql") => {
            let after = &inner[3..];
            if after.starts_with(char::is_whitespace) {
                after.trim_start()
            } else {
                inner
            }
        }
        _ => inner,
    }
}

/// First identifier-like word of `sql`.
fn leading_keyword(sql: &str) -> &str {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default()
}

/// Strip fences from the model's reply and require it to start with one of
/// `allowed_prefixes`, compared case-insensitively.
pub fn validate_sql(raw: &str, allowed_prefixes: &[String]) -> Result<String> {
    let sql = strip_code_fence(raw);
    let keyword = leading_keyword(sql);

    let allowed = !keyword.is_empty()
        && allowed_prefixes
            .iter()
            .any(|prefix| prefix.trim().eq_ignore_ascii_case(keyword));

    if !allowed {
        let shown: String = sql.chars().take(60).collect();
        return Err(QueryError::Generation(format!(
            "invalid SQL produced: expected a statement starting with {}, got '{shown}'",
            allowed_prefixes.join(" or ")
        )));
    }
    Ok(sql.to_owned())
}

/// Require a non-empty explanation that contains none of `failure_markers`
/// (case-insensitive).
pub fn validate_explanation(raw: &str, failure_markers: &[String]) -> Result<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(QueryError::Generation(
            "model could not interpret result: empty explanation".to_owned(),
        ));
    }

    let lowered = text.to_lowercase();
    if let Some(marker) = failure_markers
        .iter()
        .map(|m| m.trim().to_lowercase())
        .find(|m| !m.is_empty() && lowered.contains(m.as_str()))
    {
        return Err(QueryError::Generation(format!(
            "model could not interpret result (explanation contains '{marker}')"
        )));
    }
    Ok(text.to_owned())
}
