//! Gateway - builds the configured provider and sends requests with retry
//!
//! 설정(ProviderSettings)에서 프로바이더를 만들고, 재시도와 취소를
//! 한 곳에서 처리합니다.

use crate::{
    providers::{anthropic::AnthropicProvider, ollama::OllamaProvider, openai::OpenAiProvider},
    retry::{with_retry, RetryConfig},
    CompletionRequest, Provider, ProviderError, ProviderResponse,
};
use commitwise_foundation::{ProviderSettings, ProviderType};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Construct the provider described by `settings`.
///
/// Fails with `NotConfigured` when the provider needs an API key and none is set.
pub fn build_provider(settings: &ProviderSettings) -> Result<Arc<dyn Provider>, ProviderError> {
    settings.validate().map_err(ProviderError::NotConfigured)?;

    let model = settings.effective_model();
    let max_tokens = settings.effective_max_tokens();
    let timeout = Duration::from_secs(settings.effective_timeout());
    let api_key = settings.api_key.as_deref().unwrap_or("");
    let base_url = settings.effective_base_url();

    let provider: Arc<dyn Provider> = match settings.effective_type() {
        ProviderType::Openai => Arc::new(
            OpenAiProvider::new(api_key, model, max_tokens, timeout)?.with_base_url(base_url),
        ),
        ProviderType::Anthropic => Arc::new(
            AnthropicProvider::new(api_key, model, max_tokens, timeout)?.with_base_url(base_url),
        ),
        ProviderType::Ollama => Arc::new(OllamaProvider::new(base_url, model, max_tokens, timeout)?),
    };

    info!(
        provider = %provider.metadata().id,
        model = %provider.metadata().model,
        "provider ready"
    );
    Ok(provider)
}

/// Single-provider gateway with retry
#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn Provider>,
    retry_config: RetryConfig,
}

impl Gateway {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            retry_config: RetryConfig::default(),
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        Ok(Self::new(build_provider(settings)?))
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Send a request, retrying transient failures.
    ///
    /// The in-flight request is dropped as soon as `cancel` fires.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.provider.is_available() {
            return Err(ProviderError::NotConfigured(format!(
                "{} is not available",
                self.provider.metadata().display_name
            )));
        }

        let provider = self.provider.clone();
        let attempts = with_retry(&self.retry_config, "complete", cancel, || {
            let provider = provider.clone();
            async move { provider.complete(request).await }
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = attempts => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_not_configured() {
        let settings = ProviderSettings::new(ProviderType::Anthropic);
        assert!(matches!(
            build_provider(&settings),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_builds_each_provider() {
        let openai = build_provider(&ProviderSettings::new(ProviderType::Openai).api_key("sk-x"))
            .unwrap();
        assert_eq!(openai.metadata().id, "openai");
        assert_eq!(openai.metadata().model, "gpt-4o-mini");

        let anthropic = build_provider(
            &ProviderSettings::new(ProviderType::Anthropic)
                .api_key("key")
                .model("claude-3-5-sonnet-latest"),
        )
        .unwrap();
        assert_eq!(anthropic.metadata().model, "claude-3-5-sonnet-latest");

        let ollama = build_provider(
            &ProviderSettings::new(ProviderType::Ollama).base_url("http://gpu-box:11434"),
        )
        .unwrap();
        assert_eq!(ollama.metadata().base_url, "http://gpu-box:11434");
        assert!(ollama.is_available());
    }
}
