//! Completion model trait for structured extraction

use async_trait::async_trait;

use crate::error::Result;

/// Trait for chat-completion backends
///
/// Implementations:
/// - `AzureOpenAiClient`: Azure OpenAI chat completions deployment
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send one prompt and return the raw model response text
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model or deployment being used
    fn model(&self) -> &str;
}
