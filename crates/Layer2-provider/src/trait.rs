//! Provider trait and common types

use crate::error::ProviderError;
use crate::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider metadata
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    /// Provider ID (e.g., "anthropic")
    pub id: String,

    /// Display name (e.g., "Anthropic")
    pub display_name: String,

    /// Model this instance talks to
    pub model: String,

    /// Endpoint base URL
    pub base_url: String,

    /// Environment variable the API key is usually read from
    pub api_key_env: Option<String>,
}

/// A single non-streaming completion request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    /// Overrides the provider's configured limit
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Complete response from provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    /// Text content
    pub content: String,

    pub usage: TokenUsage,

    pub finish_reason: FinishReason,

    /// Model reported by the API
    pub model: String,
}

/// Reason for completion finishing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    /// Completed naturally
    Stop,

    /// Hit max tokens limit
    MaxTokens,

    /// Content filtered
    ContentFilter,

    /// Unknown/other
    #[default]
    Other,
}

/// AI provider trait
///
/// Implement this trait to add support for a new provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get provider metadata
    fn metadata(&self) -> &ProviderMetadata;

    /// Send messages and get a complete response
    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError>;

    /// Check if the provider is usable (e.g., API key is set)
    fn is_available(&self) -> bool;
}
