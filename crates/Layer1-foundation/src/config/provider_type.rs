use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 프로바이더 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Openai,
    Anthropic,
    Ollama,
}

impl ProviderType {
    /// 표시 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Openai => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    /// API Key 필요 여부
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// API Key 환경변수
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Openai => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }

    /// 기본 Base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Openai => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Ollama => "http://localhost:11434",
        }
    }

    /// 기본 모델
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Openai => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Ollama => "llama3",
        }
    }

    /// 기본 max_tokens (커밋 메시지는 짧다)
    pub fn default_max_tokens(&self) -> u32 {
        512
    }

    /// 기본 타임아웃 (초)
    pub fn default_timeout(&self) -> u64 {
        match self {
            Self::Ollama => 120,
            _ => 60,
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name().to_lowercase())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::Openai),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!(
                "unknown provider '{}' (expected openai, anthropic or ollama)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_roundtrips_display() {
        for ty in [ProviderType::Openai, ProviderType::Anthropic, ProviderType::Ollama] {
            assert_eq!(ty.to_string().parse::<ProviderType>().unwrap(), ty);
        }
        assert!("gemini".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        assert!(!ProviderType::Ollama.requires_api_key());
        assert!(ProviderType::Ollama.api_key_env().is_none());
        assert_eq!(ProviderType::Openai.api_key_env(), Some("OPENAI_API_KEY"));
    }
}
