//! OpenAI (and OpenAI-compatible) chat completions provider

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

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    max_tokens: u32,
    metadata: ProviderMetadata,
}

impl OpenAiProvider {
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
                id: "openai".to_string(),
                display_name: "OpenAI".to_string(),
                model: model.into(),
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
            },
        })
    }

    /// Custom base URL (Azure, LocalAI, vLLM, ...)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.metadata.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        join_url(&self.metadata.base_url, "chat/completions")
    }

    fn build_request(&self, request: &CompletionRequest) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system_prompt {
            messages.push(OpenAiMessage::from(&Message::system(system.clone())));
        }
        messages.extend(
            request
                .messages
                .iter()
                .filter(|m| m.role != MessageRole::System)
                .map(OpenAiMessage::from),
        );

        OpenAiRequest {
            model: self.metadata.model.clone(),
            messages,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature,
        }
    }

    /// Parse error response from OpenAI API
    fn parse_error_response(status: u16, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let error = error_response.error;
            let message = error.message;

            return match error.code.as_deref() {
                Some("rate_limit_exceeded") => ProviderError::RateLimited {
                    retry_after_ms: None,
                },
                Some("context_length_exceeded") => ProviderError::ContextLengthExceeded(message),
                Some("invalid_api_key") => ProviderError::Authentication(message),
                Some("insufficient_quota") => ProviderError::QuotaExceeded(message),
                Some("model_not_found") => ProviderError::ModelNotFound(message),
                _ => ProviderError::from_http_status(status, &message),
            };
        }

        ProviderError::from_http_status(status, body)
    }

    fn parse_response(response: OpenAiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice =
            response.choices.into_iter().next().ok_or_else(|| {
                ProviderError::InvalidResponse("No choices in response".to_string())
            })?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::MaxTokens,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        };

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: response
                .usage
                .map(|u| TokenUsage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
            finish_reason,
            model: response.model,
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_request(request);
        debug!(model = %body.model, messages = body.messages.len(), "openai request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Self::parse_response(api_response)
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: Some(msg.content.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new("sk-test", "gpt-4o-mini", 256, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_puts_system_first() {
        let request = CompletionRequest::new(vec![Message::user("diff")])
            .with_system("rules")
            .with_temperature(0.2);
        let json = serde_json::to_value(provider().build_request(&request)).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "rules");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"message": {"role": "assistant", "content": "feat: add x"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 6}
        }"#;
        let parsed: OpenAiResponse = serde_json::from_str(body).unwrap();
        let response = OpenAiProvider::parse_response(parsed).unwrap();

        assert_eq!(response.content, "feat: add x");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.input_tokens, 120);
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let parsed: OpenAiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            OpenAiProvider::parse_response(parsed),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_error_codes() {
        let body = r#"{"error": {"message": "Incorrect API key", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        assert!(matches!(
            OpenAiProvider::parse_error_response(401, body),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            OpenAiProvider::parse_error_response(502, "<html>bad gateway</html>"),
            ProviderError::ServerError(_)
        ));
    }

    #[test]
    fn test_availability_and_endpoint() {
        assert!(provider().is_available());
        let custom = provider().with_base_url("http://localhost:8080/v1/");
        assert_eq!(custom.endpoint(), "http://localhost:8080/v1/chat/completions");

        let keyless = OpenAiProvider::new("", "gpt-4o-mini", 256, Duration::from_secs(5)).unwrap();
        assert!(!keyless.is_available());
    }
}
