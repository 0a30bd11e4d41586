//! Ollama (local) chat provider

use super::{http_client, join_url};
use crate::{
    error::ProviderError,
    r#trait::{CompletionRequest, FinishReason, Provider, ProviderMetadata, ProviderResponse, TokenUsage},
    Message, MessageRole,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Ollama provider for local models. No API key.
pub struct OllamaProvider {
    client: Client,
    max_tokens: u32,
    metadata: ProviderMetadata,
}

impl OllamaProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            max_tokens,
            metadata: ProviderMetadata {
                id: "ollama".to_string(),
                display_name: "Ollama".to_string(),
                model: model.into(),
                base_url: base_url.into(),
                api_key_env: None,
            },
        })
    }

    fn chat_url(&self) -> String {
        join_url(&self.metadata.base_url, "api/chat")
    }

    fn build_request(&self, request: &CompletionRequest) -> OllamaRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system_prompt {
            messages.push(OllamaMessage::from(&Message::system(system.clone())));
        }
        messages.extend(request.messages.iter().map(OllamaMessage::from));

        OllamaRequest {
            model: self.metadata.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                num_predict: request.max_tokens.unwrap_or(self.max_tokens),
                temperature: request.temperature,
            },
        }
    }

    fn parse_error_response(status: u16, body: &str) -> ProviderError {
        // {"error": "model 'x' not found, try pulling it first"}
        let message = serde_json::from_str::<OllamaErrorResponse>(body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.to_string());

        if message.contains("not found") {
            ProviderError::ModelNotFound(message)
        } else {
            ProviderError::from_http_status(status, &message)
        }
    }

    fn parse_response(response: OllamaResponse) -> ProviderResponse {
        let finish_reason = match response.done_reason.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::MaxTokens,
            _ => FinishReason::Other,
        };

        ProviderResponse {
            content: response.message.content,
            usage: TokenUsage {
                input_tokens: response.prompt_eval_count.unwrap_or(0),
                output_tokens: response.eval_count.unwrap_or(0),
            },
            finish_reason,
            model: response.model,
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_request(request);
        debug!(model = %body.model, url = %self.chat_url(), "ollama request");

        let response = self
            .client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let api_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(Self::parse_response(api_response))
    }

    fn is_available(&self) -> bool {
        !self.metadata.base_url.is_empty()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: MessageRole,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}
