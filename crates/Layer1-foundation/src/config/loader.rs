//! Configuration Loader
//!
//! ## 검색 우선순위
//!
//! 1. User-level: `<config_dir>/commitwise/config.yaml`
//! 2. Project-level: `<repo>/.commitwise.yaml`
//! 3. 환경변수 (`COMMITWISE_*`, provider API key)
//!
//! 각 레벨의 설정이 이전 레벨을 오버라이드합니다.

use super::provider_type::ProviderType;
use super::store::YamlStore;
use super::types::CommitwiseConfig;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 사용자 설정 파일 이름
pub const USER_CONFIG_FILE: &str = "config.yaml";

/// 프로젝트 설정 파일 이름
pub const PROJECT_CONFIG_FILE: &str = ".commitwise.yaml";

pub const ENV_PROVIDER: &str = "COMMITWISE_PROVIDER";
pub const ENV_MODEL: &str = "COMMITWISE_MODEL";
pub const ENV_API_KEY: &str = "COMMITWISE_API_KEY";
pub const ENV_BASE_URL: &str = "COMMITWISE_BASE_URL";

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

// ============================================================================
// ConfigLoader - 설정 로더
// ============================================================================

/// 설정 로더
pub struct ConfigLoader {
    /// 검색 경로 (우선순위 오름차순)
    search_paths: Vec<ConfigPath>,
    /// 환경변수 조회 함수 (테스트에서 교체)
    env: EnvLookup,
}

#[derive(Debug, Clone)]
struct ConfigPath {
    store: YamlStore,
    filename: &'static str,
    description: &'static str,
}

impl ConfigLoader {
    /// 기본 검색 경로로 생성
    pub fn new(repo_root: Option<&Path>) -> Self {
        let user = YamlStore::global().ok();
        let project = repo_root.map(YamlStore::project);
        Self::from_stores(user, project)
    }

    /// 저장소를 직접 지정해 생성
    pub fn from_stores(user: Option<YamlStore>, project: Option<YamlStore>) -> Self {
        let mut search_paths = Vec::new();
        if let Some(store) = user {
            search_paths.push(ConfigPath {
                store,
                filename: USER_CONFIG_FILE,
                description: "User settings",
            });
        }
        if let Some(store) = project {
            search_paths.push(ConfigPath {
                store,
                filename: PROJECT_CONFIG_FILE,
                description: "Project settings",
            });
        }

        Self {
            search_paths,
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// 환경변수 조회 함수 교체
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// 모든 레벨을 병합해 로드 (존재하지만 파싱 불가한 파일은 에러)
    pub fn load_all(&self) -> Result<CommitwiseConfig> {
        let mut merged = CommitwiseConfig::new();

        for config_path in &self.search_paths {
            if let Some(config) = config_path
                .store
                .load_optional::<CommitwiseConfig>(config_path.filename)?
            {
                info!(
                    "Loaded {} from: {}",
                    config_path.description,
                    config_path.store.file_path(config_path.filename).display()
                );
                merged.merge(config);
            }
        }

        self.apply_env(&mut merged)?;
        Ok(merged)
    }

    /// 환경변수 오버라이드 적용
    fn apply_env(&self, config: &mut CommitwiseConfig) -> Result<()> {
        if let Some(value) = self.non_empty(ENV_PROVIDER) {
            let ty: ProviderType = value.parse().map_err(Error::Config)?;
            debug!("provider overridden by {}", ENV_PROVIDER);
            config.provider.merge(super::ProviderSettings::new(ty));
        }
        if let Some(model) = self.non_empty(ENV_MODEL) {
            config.provider.model = Some(model);
        }
        if let Some(url) = self.non_empty(ENV_BASE_URL) {
            config.provider.base_url = Some(url);
        }

        if let Some(key) = self.non_empty(ENV_API_KEY) {
            config.provider.api_key = Some(key);
        } else if config.provider.api_key.is_none() {
            // provider 고유 환경변수 (OPENAI_API_KEY 등)
            if let Some(env_name) = config.provider.effective_type().api_key_env() {
                if let Some(key) = self.non_empty(env_name) {
                    debug!("api key taken from {}", env_name);
                    config.provider.api_key = Some(key);
                }
            }
        }

        Ok(())
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.trim().is_empty())
    }

    /// 존재하는 설정 파일 목록
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .filter(|p| p.store.exists(p.filename))
            .map(|p| p.store.file_path(p.filename))
            .collect()
    }
}
