//! OpenAI chat client used to draft column and table descriptions.

use crate::config::AIConfig;
use crate::error::{CatalogError, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use secrecy::ExposeSecret as _;
use std::future::Future;

/// Black-box text generation: prompt in, completion out.
pub trait Completion {
    /// Send `prompt` and return the raw reply text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Completion`] when the model call fails.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>>;
}

pub struct CompletionClient {
    client: Client<OpenAIConfig>,
    config: AIConfig,
}

impl CompletionClient {
    /// Create a client from the session's AI settings.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if no API key is configured.
    pub fn new(config: AIConfig) -> Result<Self> {
        if !config.has_api_key() {
            return Err(CatalogError::Config("OpenAI API key is not set".to_owned()));
        }
        let openai_config = OpenAIConfig::new().with_api_key(config.api_key.expose_secret());
        let client = Client::with_config(openai_config);

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &'static str {
        self.config.model.as_str()
    }
}

impl Completion for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| CatalogError::Completion(format!("failed to build message: {e}")))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.config.model.as_str())
            .messages(messages)
            .temperature(self.config.temperature)
            .build()
            .map_err(|e| CatalogError::Completion(format!("failed to build request: {e}")))?;

        tracing::debug!("Sending completion request to {}", self.model());
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| CatalogError::Completion(format!("OpenAI API error: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CatalogError::Completion("no response content received".to_owned()))
    }
}
