use std::path::PathBuf;

/// Quote an SQL identifier, doubling any embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Base directory for tabletalk's own data (logs), e.g. `~/.local/share/tabletalk`.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("tabletalk"))
}
