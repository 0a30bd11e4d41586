//! # commitwise-foundation
//!
//! Foundation layer for commitwise:
//! - Error: 공통 에러 타입
//! - Config: YAML 설정 (user / project / env 병합)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Layer4-cli      (commitwise binary)         │
//! │        │                                     │
//! │        ▼                                     │
//! │  Layer2-core     Layer2-provider             │
//! │  (git, staging,  (AI commit message)         │
//! │   cancel, commit)                            │
//! │        │               │                     │
//! │        └──────┬────────┘                     │
//! │               ▼                              │
//! │  Layer1-foundation (error, config)           │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    AiSettings, AutoStageSetting, CommitSettings, CommitwiseConfig, ConfigLoader, PromptSettings,
    ProviderSettings, ProviderType, StagingSettings, YamlStore, PROJECT_CONFIG_FILE,
    USER_CONFIG_FILE,
};
