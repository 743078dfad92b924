//! Process-wide settings.
//!
//! A [`Settings`] value is built once at startup (file, then CLI overrides) and
//! handed to each component's constructor. Components never look settings up on
//! their own.

use anyhow::{Context as _, Result};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::QueryError;

/// Stored in the config file in place of a real API key.
pub const API_KEY_PLACEHOLDER: &str = "__ENV__";

/// Environment variable the real API key is resolved from.
pub const API_KEY_ENV: &str = "TABLETALK_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    pub api_base: String,
    #[serde(serialize_with = "serialize_api_key", deserialize_with = "deserialize_api_key")]
    pub api_key: SecretString,
    pub model: String,
    pub temperature: f32,
    pub seed: i64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".to_owned(),
            api_key: SecretString::new(API_KEY_PLACEHOLDER.into()),
            model: "llama3:8b-instruct-q3_K_m".to_owned(),
            temperature: 0.0,
            seed: 42,
        }
    }
}

impl LlmConfig {
    /// The key to send to the API. Placeholder or empty keys resolve from
    /// [`API_KEY_ENV`], falling back to the local Ollama convention.
    pub fn resolved_api_key(&self) -> String {
        let key = self.api_key.expose_secret();
        if key.is_empty() || key == API_KEY_PLACEHOLDER {
            std::env::var(API_KEY_ENV).unwrap_or_else(|_| "ollama".to_owned())
        } else {
            key.to_owned()
        }
    }
}

fn serialize_api_key<S>(key: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if key.expose_secret().is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str(API_KEY_PLACEHOLDER)
    }
}

fn deserialize_api_key<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s.into()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file. Its basename is part of the analysis cache key.
    pub path: PathBuf,
    /// Table every question is asked against
    pub table: String,
    /// CSV file loaded by `tabletalk load` when no file is given
    pub csv_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("freelancers.db"),
            table: "freelancers".to_owned(),
            csv_path: PathBuf::from("data/freelancer_earnings_bd.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Numeric columns with at most this many distinct values are categorical
    pub categorical_threshold: u64,
    pub cache_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            categorical_threshold: 20,
            cache_dir: PathBuf::from(".cache"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum question length in characters, after trimming
    pub min_question_len: usize,
    /// Leading keywords a generated statement may start with (case-insensitive)
    pub sql_prefixes: Vec<String>,
    /// Substrings (case-insensitive) that mark an explanation as a failed interpretation
    pub failure_markers: Vec<String>,
    /// Rows of the result shown to the model when asking for an explanation
    pub preview_rows: usize,
    /// Upper bound on SQL execution; 0 disables the bound
    pub query_timeout_secs: u64,
    /// Upper bound on each model call; 0 disables the bound
    pub model_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_question_len: 5,
            sql_prefixes: vec!["select".to_owned()],
            failure_markers: vec!["error".to_owned(), "can't".to_owned(), "unknown".to_owned()],
            preview_rows: 10,
            query_timeout_secs: 30,
            model_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }

    pub fn model_timeout(&self) -> Option<Duration> {
        (self.model_timeout_secs > 0).then(|| Duration::from_secs(self.model_timeout_secs))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub analysis: AnalysisConfig,
    pub pipeline: PipelineConfig,
}

impl Settings {
    /// Platform config location, e.g. `~/.config/tabletalk/config.json` on Linux.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("tabletalk").join("config.json"))
    }

    /// Load settings from `path`, or from [`Settings::default_path`] when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_path()?;
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings JSON in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Config`] naming the first offending field.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.database.table.trim().is_empty() {
            return Err(QueryError::Config("database.table must not be empty".to_owned()));
        }
        if self.pipeline.min_question_len == 0 {
            return Err(QueryError::Config(
                "pipeline.min_question_len must be at least 1".to_owned(),
            ));
        }
        if self.pipeline.preview_rows == 0 {
            return Err(QueryError::Config(
                "pipeline.preview_rows must be at least 1".to_owned(),
            ));
        }
        if self.pipeline.sql_prefixes.iter().all(|p| p.trim().is_empty()) {
            return Err(QueryError::Config(
                "pipeline.sql_prefixes must contain at least one keyword".to_owned(),
            ));
        }
        Ok(())
    }
}
