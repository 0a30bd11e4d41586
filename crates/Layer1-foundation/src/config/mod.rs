//! Config - commitwise 설정
//!
//! - `types`: 통합 설정 구조체 (섹션별 Option 필드 + effective_* 기본값)
//! - `provider_type`: AI 프로바이더 종류
//! - `store`: YAML 파일 저장소
//! - `loader`: user → project → env 순서로 병합

mod loader;
mod provider_type;
mod store;
mod types;

pub use loader::{
    ConfigLoader, ENV_API_KEY, ENV_BASE_URL, ENV_MODEL, ENV_PROVIDER, PROJECT_CONFIG_FILE,
    USER_CONFIG_FILE,
};
pub use provider_type::ProviderType;
pub use store::YamlStore;
pub use types::{
    AiSettings, AutoStageSetting, CommitSettings, CommitwiseConfig, PromptSettings,
    ProviderSettings, StagingSettings, DEFAULT_COMMIT_TYPES, DEFAULT_GIT_TIMEOUT_SECS,
    DEFAULT_MAX_DIFF_CHARS, DEFAULT_MAX_HEADER_LENGTH, DEFAULT_PROMPT_ATTEMPTS,
    DEFAULT_RESTORATION_TIMEOUT_SECS,
};
