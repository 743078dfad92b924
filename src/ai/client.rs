//! OpenAI-compatible chat client.
//!
//! Generation parameters (temperature and seed) come from [`LlmConfig`] and are
//! sent with every request so repeated questions get repeatable answers.

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};

use super::LanguageModel;
use crate::config::LlmConfig;
use crate::error::{QueryError, Result};

pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    config: LlmConfig,
}

impl OpenAiModel {
    pub fn new(config: &LlmConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(&config.api_base)
            .with_api_key(config.resolved_api_key());
        let client = Client::with_config(openai_config);

        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.config.model
    }

    /// Send a minimal prompt to check the endpoint answers at all.
    ///
    /// # Errors
    ///
    /// `Model` if the request fails or the reply is empty.
    pub async fn test_connection(&self) -> Result<()> {
        let reply = self.complete("Reply with the single word: ok").await?;
        if reply.is_empty() {
            return Err(QueryError::Model("Received empty response".to_owned()));
        }
        Ok(())
    }
}

impl LanguageModel for OpenAiModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| QueryError::Model(format!("Failed to build user message: {e}")))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(messages)
            .temperature(self.config.temperature)
            .seed(self.config.seed)
            .build()
            .map_err(|e| QueryError::Model(format!("Failed to build chat request: {e}")))?;

        tracing::debug!(model = %self.config.model, "Sending completion request");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| QueryError::Model(format!("API error: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .ok_or_else(|| QueryError::Model("No response content received".to_owned()))
    }
}
