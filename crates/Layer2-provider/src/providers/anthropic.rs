//! Anthropic Messages API provider

use super::{http_client, join_url};
use crate::{
    error::ProviderError,
    r#trait::{CompletionRequest, FinishReason, Provider, ProviderMetadata, ProviderResponse, TokenUsage},
    MessageRole,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    max_tokens: u32,
    metadata: ProviderMetadata,
}

impl AnthropicProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            max_tokens,
            metadata: ProviderMetadata {
                id: "anthropic".to_string(),
                display_name: "Anthropic".to_string(),
                model: model.into(),
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            },
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.metadata.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        join_url(&self.metadata.base_url, "v1/messages")
    }

    /// System text goes in the top-level `system` field, never as a message
    fn build_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let mut system: Vec<&str> = request.system_prompt.iter().map(String::as_str).collect();
        let mut messages = Vec::with_capacity(request.messages.len());

        for msg in &request.messages {
            match msg.role {
                MessageRole::System => system.push(&msg.content),
                MessageRole::User => messages.push(AnthropicMessage::new("user", &msg.content)),
                MessageRole::Assistant => {
                    messages.push(AnthropicMessage::new("assistant", &msg.content))
                }
            }
        }

        AnthropicRequest {
            model: self.metadata.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n\n"))
            },
            messages,
            temperature: request.temperature,
        }
    }

    fn parse_error_response(status: u16, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<AnthropicErrorResponse>(body) {
            let message = error_response.error.message;
            return match error_response.error.error_type.as_str() {
                "authentication_error" | "permission_error" => {
                    ProviderError::Authentication(message)
                }
                "rate_limit_error" => ProviderError::RateLimited {
                    retry_after_ms: None,
                },
                "overloaded_error" | "api_error" => ProviderError::ServerError(message),
                "not_found_error" => ProviderError::ModelNotFound(message),
                _ => ProviderError::from_http_status(status, &message),
            };
        }

        ProviderError::from_http_status(status, body)
    }

    fn parse_response(response: AnthropicResponse) -> ProviderResponse {
        let content = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let finish_reason = match response.stop_reason.as_deref() {
            Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
            Some("max_tokens") => FinishReason::MaxTokens,
            _ => FinishReason::Other,
        };

        ProviderResponse {
            content,
            usage: TokenUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
            finish_reason,
            model: response.model,
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_request(request);
        debug!(model = %body.model, messages = body.messages.len(), "anthropic request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(Self::parse_response(api_response))
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

impl AnthropicMessage {
    fn new(role: &'static str, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
