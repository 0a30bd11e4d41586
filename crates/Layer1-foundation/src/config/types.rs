//! Config types - 통합 설정
//!
//! 파일에서 읽은 값은 모두 `Option`으로 보관하고, 실제 값은
//! `effective_*` 메서드로 기본값과 함께 계산한다. 그래야 레이어별
//! 병합이 필드 단위로 동작한다.

use serde::{Deserialize, Serialize};

use super::provider_type::ProviderType;

/// 기본 Conventional Commits 타입 목록
pub const DEFAULT_COMMIT_TYPES: &[&str] = &[
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert",
];

/// 기본 헤더 최대 길이
pub const DEFAULT_MAX_HEADER_LENGTH: usize = 72;

/// 기본 복원 대기 시간 (초)
pub const DEFAULT_RESTORATION_TIMEOUT_SECS: u64 = 5;

/// 기본 git 명령 타임아웃 (초)
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 30;

/// 기본 프롬프트 재시도 횟수
pub const DEFAULT_PROMPT_ATTEMPTS: u32 = 3;

/// AI에 보낼 diff 최대 길이 (문자)
pub const DEFAULT_MAX_DIFF_CHARS: usize = 12_000;

// ============================================================================
// CommitwiseConfig (통합)
// ============================================================================

/// commitwise 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitwiseConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub commit: CommitSettings,

    #[serde(default)]
    pub staging: StagingSettings,

    #[serde(default)]
    pub prompt: PromptSettings,

    #[serde(default)]
    pub ai: AiSettings,
}

impl CommitwiseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: CommitwiseConfig) {
        self.provider.merge(other.provider);
        self.commit.merge(other.commit);
        self.staging.merge(other.staging);
        self.prompt.merge(other.prompt);
        self.ai.merge(other.ai);
    }

    /// 모든 기본값이 채워진 설정 (config init 용)
    pub fn with_defaults() -> Self {
        let provider_type = ProviderType::Openai;
        Self {
            provider: ProviderSettings {
                provider_type: Some(provider_type),
                model: Some(provider_type.default_model().to_string()),
                api_key: None,
                base_url: None,
                max_tokens: Some(provider_type.default_max_tokens()),
                timeout_secs: Some(provider_type.default_timeout()),
            },
            commit: CommitSettings {
                types: Some(DEFAULT_COMMIT_TYPES.iter().map(|t| t.to_string()).collect()),
                scopes: None,
                require_scope: Some(false),
                max_header_length: Some(DEFAULT_MAX_HEADER_LENGTH),
                sign: Some(true),
            },
            staging: StagingSettings {
                default_mode: Some(AutoStageSetting::None),
                restoration_timeout_secs: Some(DEFAULT_RESTORATION_TIMEOUT_SECS),
                git_timeout_secs: Some(DEFAULT_GIT_TIMEOUT_SECS),
            },
            prompt: PromptSettings {
                max_attempts: Some(DEFAULT_PROMPT_ATTEMPTS),
                confirm: Some(true),
            },
            ai: AiSettings {
                enabled: Some(false),
                max_diff_chars: Some(DEFAULT_MAX_DIFF_CHARS),
            },
        }
    }
}

// ============================================================================
// Provider Settings
// ============================================================================

/// AI 프로바이더 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// 프로바이더 타입
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<ProviderType>,

    /// 모델 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API 키
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// 최대 출력 토큰
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// 타임아웃 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderSettings {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type: Some(provider_type),
            ..Default::default()
        }
    }

    pub fn effective_type(&self) -> ProviderType {
        self.provider_type.unwrap_or(ProviderType::Openai)
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.effective_type().default_base_url())
    }

    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.effective_type().default_model())
    }

    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens
            .unwrap_or_else(|| self.effective_type().default_max_tokens())
    }

    pub fn effective_timeout(&self) -> u64 {
        self.timeout_secs
            .unwrap_or_else(|| self.effective_type().default_timeout())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let ty = self.effective_type();
        if ty.requires_api_key() && self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(format!("{} requires an api_key", ty));
        }
        Ok(())
    }

    pub fn merge(&mut self, other: ProviderSettings) {
        // 타입이 바뀌면 이전 타입의 키/URL은 의미가 없다
        if let Some(ty) = other.provider_type {
            if self.provider_type != Some(ty) {
                self.api_key = None;
                self.base_url = None;
                self.model = None;
            }
            self.provider_type = Some(ty);
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.max_tokens.is_some() {
            self.max_tokens = other.max_tokens;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    // 빌더
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

// ============================================================================
// Commit Settings
// ============================================================================

/// 커밋 메시지 규칙 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitSettings {
    /// 허용된 타입 목록
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,

    /// 허용된 scope 목록 (없으면 자유)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,

    /// scope 필수 여부
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_scope: Option<bool>,

    /// 헤더 최대 길이
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_header_length: Option<usize>,

    /// 서명 커밋 시도 여부
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<bool>,
}

impl CommitSettings {
    pub fn effective_types(&self) -> Vec<String> {
        match &self.types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => DEFAULT_COMMIT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn effective_scopes(&self) -> Option<Vec<String>> {
        self.scopes.clone().filter(|s| !s.is_empty())
    }

    pub fn effective_require_scope(&self) -> bool {
        self.require_scope.unwrap_or(false)
    }

    pub fn effective_max_header_length(&self) -> usize {
        self.max_header_length
            .filter(|len| *len > 0)
            .unwrap_or(DEFAULT_MAX_HEADER_LENGTH)
    }

    pub fn effective_sign(&self) -> bool {
        self.sign.unwrap_or(true)
    }

    pub fn merge(&mut self, other: CommitSettings) {
        if other.types.is_some() {
            self.types = other.types;
        }
        if other.scopes.is_some() {
            self.scopes = other.scopes;
        }
        if other.require_scope.is_some() {
            self.require_scope = other.require_scope;
        }
        if other.max_header_length.is_some() {
            self.max_header_length = other.max_header_length;
        }
        if other.sign.is_some() {
            self.sign = other.sign;
        }
    }
}

// ============================================================================
// Staging Settings
// ============================================================================

/// 자동 staging 기본 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoStageSetting {
    /// 자동 staging 하지 않음
    #[default]
    None,
    /// 수정된 tracked 파일만
    Modified,
    /// 수정 + untracked 파일
    All,
}

/// staging / 복원 관련 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<AutoStageSetting>,

    /// 인터럽트 후 복원 대기 시간 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restoration_timeout_secs: Option<u64>,

    /// git 명령 하나당 타임아웃 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_timeout_secs: Option<u64>,
}

impl StagingSettings {
    pub fn effective_default_mode(&self) -> AutoStageSetting {
        self.default_mode.unwrap_or_default()
    }

    pub fn effective_restoration_timeout(&self) -> u64 {
        self.restoration_timeout_secs
            .unwrap_or(DEFAULT_RESTORATION_TIMEOUT_SECS)
    }

    pub fn effective_git_timeout(&self) -> u64 {
        self.git_timeout_secs.unwrap_or(DEFAULT_GIT_TIMEOUT_SECS)
    }

    pub fn merge(&mut self, other: StagingSettings) {
        if other.default_mode.is_some() {
            self.default_mode = other.default_mode;
        }
        if other.restoration_timeout_secs.is_some() {
            self.restoration_timeout_secs = other.restoration_timeout_secs;
        }
        if other.git_timeout_secs.is_some() {
            self.git_timeout_secs = other.git_timeout_secs;
        }
    }
}

// ============================================================================
// Prompt Settings
// ============================================================================

/// 대화형 프롬프트 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptSettings {
    /// 잘못된 입력 시 재시도 횟수
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// 커밋 전 확인 여부
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm: Option<bool>,
}

impl PromptSettings {
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PROMPT_ATTEMPTS)
    }

    pub fn effective_confirm(&self) -> bool {
        self.confirm.unwrap_or(true)
    }

    pub fn merge(&mut self, other: PromptSettings) {
        if other.max_attempts.is_some() {
            self.max_attempts = other.max_attempts;
        }
        if other.confirm.is_some() {
            self.confirm = other.confirm;
        }
    }
}

// ============================================================================
// AI Settings
// ============================================================================

/// AI 메시지 생성 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    /// 기본으로 AI 사용
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_diff_chars: Option<usize>,
}

impl AiSettings {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn effective_max_diff_chars(&self) -> usize {
        self.max_diff_chars
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_DIFF_CHARS)
    }

    pub fn merge(&mut self, other: AiSettings) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.max_diff_chars.is_some() {
            self.max_diff_chars = other.max_diff_chars;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = CommitwiseConfig::new();
        assert_eq!(config.commit.effective_max_header_length(), 72);
        assert_eq!(config.staging.effective_restoration_timeout(), 5);
        assert_eq!(config.prompt.effective_max_attempts(), 3);
        assert!(config.commit.effective_sign());
        assert!(config.commit.effective_types().contains(&"feat".to_string()));
        assert_eq!(config.staging.effective_default_mode(), AutoStageSetting::None);
    }

    #[test]
    fn test_merge_is_field_wise() {
        let mut base = CommitwiseConfig::new();
        base.commit.max_header_length = Some(50);
        base.commit.sign = Some(false);

        let mut later = CommitwiseConfig::new();
        later.commit.sign = Some(true);

        base.merge(later);
        assert_eq!(base.commit.effective_max_header_length(), 50);
        assert!(base.commit.effective_sign());
    }

    #[test]
    fn test_provider_type_switch_drops_stale_key() {
        let mut settings = ProviderSettings::new(ProviderType::Openai).api_key("sk-openai");
        settings.merge(ProviderSettings::new(ProviderType::Ollama));

        assert_eq!(settings.effective_type(), ProviderType::Ollama);
        assert!(settings.api_key.is_none());
        assert_eq!(settings.effective_base_url(), "http://localhost:11434");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_provider_requires_key() {
        let settings = ProviderSettings::new(ProviderType::Anthropic);
        assert!(settings.validate().is_err());
        assert!(settings.api_key("sk-ant").validate().is_ok());
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = r#"
provider:
  type: anthropic
  model: claude-3-5-sonnet-latest
commit:
  types: [feat, fix]
  require_scope: true
staging:
  default_mode: all
  restoration_timeout_secs: 2
"#;
        let config: CommitwiseConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.effective_type(), ProviderType::Anthropic);
        assert_eq!(config.provider.effective_model(), "claude-3-5-sonnet-latest");
        assert_eq!(config.commit.effective_types(), vec!["feat", "fix"]);
        assert!(config.commit.effective_require_scope());
        assert_eq!(config.staging.effective_default_mode(), AutoStageSetting::All);
        assert_eq!(config.staging.effective_restoration_timeout(), 2);
    }

    #[test]
    fn test_with_defaults_serializes() {
        let yaml = serde_yaml::to_string(&CommitwiseConfig::with_defaults()).unwrap();
        assert!(yaml.contains("type: openai"));
        assert!(yaml.contains("restoration_timeout_secs: 5"));
        assert!(!yaml.contains("api_key"));
    }
}
