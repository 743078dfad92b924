//! Language-model collaborator.
//!
//! The pipeline only depends on [`LanguageModel`]. [`client::OpenAiModel`] talks
//! to any OpenAI-compatible chat endpoint (OpenAI itself, Ollama, vLLM);
//! [`prompts`] renders the two prompts the pipeline sends.

use std::future::Future;

use crate::error::Result;

pub mod client;
pub mod prompts;

pub use client::OpenAiModel;

/// A black-box text completion service.
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`. Failures of the service itself are `Model` errors;
    /// judging the returned text is the caller's job.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}
