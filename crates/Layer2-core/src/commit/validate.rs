//! Conventional Commits rule checks

use commitwise_foundation::CommitSettings;
use thiserror::Error;

use super::conventional::ConventionalCommit;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("commit message is empty")]
    EmptyMessage,

    #[error("header must look like `type(scope): description`, got `{0}`")]
    MalformedHeader(String),

    #[error("unknown type `{found}` (allowed: {})", .allowed.join(", "))]
    UnknownType { found: String, allowed: Vec<String> },

    #[error("a scope is required")]
    MissingScope,

    #[error("scope must not be empty")]
    EmptyScope,

    #[error("scope `{found}` is not allowed (allowed: {})", .allowed.join(", "))]
    ScopeNotAllowed { found: String, allowed: Vec<String> },

    #[error("description must not be empty")]
    EmptyDescription,

    #[error("header is {length} characters; the limit is {max}")]
    HeaderTooLong { length: usize, max: usize },

    #[error("description must not end with a period")]
    TrailingPeriod,

    #[error("header must be followed by a blank line")]
    MissingBlankLine,
}

impl From<ValidationError> for commitwise_foundation::Error {
    fn from(e: ValidationError) -> Self {
        commitwise_foundation::Error::Validation(e.to_string())
    }
}

/// Rules a commit message must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRules {
    pub types: Vec<String>,
    /// `None` allows any scope
    pub scopes: Option<Vec<String>>,
    pub require_scope: bool,
    pub max_header_length: usize,
}

impl Default for CommitRules {
    fn default() -> Self {
        Self::from_settings(&CommitSettings::default())
    }
}

impl CommitRules {
    pub fn from_settings(settings: &CommitSettings) -> Self {
        Self {
            types: settings.effective_types(),
            scopes: settings.effective_scopes(),
            require_scope: settings.effective_require_scope(),
            max_header_length: settings.effective_max_header_length(),
        }
    }

    /// Parse and check a message
    pub fn validate(&self, message: &str) -> Result<ConventionalCommit, ValidationError> {
        let commit = ConventionalCommit::parse(message)?;
        self.check(&commit)?;
        Ok(commit)
    }

    /// Check an already-built commit
    pub fn check(&self, commit: &ConventionalCommit) -> Result<(), ValidationError> {
        if !self.types.iter().any(|t| t == &commit.commit_type) {
            return Err(ValidationError::UnknownType {
                found: commit.commit_type.clone(),
                allowed: self.types.clone(),
            });
        }

        match (&commit.scope, &self.scopes) {
            (None, _) if self.require_scope => return Err(ValidationError::MissingScope),
            (Some(scope), Some(allowed)) if !allowed.iter().any(|s| s == scope) => {
                return Err(ValidationError::ScopeNotAllowed {
                    found: scope.clone(),
                    allowed: allowed.clone(),
                })
            }
            _ => {}
        }

        if commit.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if commit.description.ends_with('.') {
            return Err(ValidationError::TrailingPeriod);
        }

        let length = commit.header().chars().count();
        if length > self.max_header_length {
            return Err(ValidationError::HeaderTooLong {
                length,
                max: self.max_header_length,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_accept_common_messages() {
        let rules = CommitRules::default();
        assert!(rules.validate("feat: add auto staging").is_ok());
        assert!(rules.validate("fix(git)!: restore index on abort").is_ok());
        assert!(rules.validate("chore(deps): bump tokio\n\nRoutine.").is_ok());
    }

    #[test]
    fn test_unknown_type() {
        let err = CommitRules::default().validate("feature: add x").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownType { ref found, .. } if found == "feature"));
        assert!(err.to_string().contains("feat, fix"));
    }

    #[test]
    fn test_scope_rules() {
        let rules = CommitRules {
            scopes: Some(vec!["core".into(), "cli".into()]),
            require_scope: true,
            ..CommitRules::default()
        };
        assert_eq!(
            rules.validate("feat: x").unwrap_err(),
            ValidationError::MissingScope
        );
        assert!(matches!(
            rules.validate("feat(web): x").unwrap_err(),
            ValidationError::ScopeNotAllowed { .. }
        ));
        assert!(rules.validate("feat(cli): x").is_ok());
    }

    #[test]
    fn test_header_length_counts_chars() {
        let rules = CommitRules {
            max_header_length: 20,
            ..CommitRules::default()
        };
        // 5 + 15 = 20 chars, but more than 20 bytes
        assert!(rules.validate(&format!("fix: {}", "ñ".repeat(15))).is_ok());
        assert!(rules.validate(&format!("fix: {}", "ñ".repeat(16))).is_err());
    }

    #[test]
    fn test_trailing_period() {
        assert_eq!(
            CommitRules::default().validate("docs: update readme.").unwrap_err(),
            ValidationError::TrailingPeriod
        );
    }

    #[test]
    fn test_from_settings() {
        let settings = CommitSettings {
            types: Some(vec!["feat".into()]),
            max_header_length: Some(50),
            ..Default::default()
        };
        let rules = CommitRules::from_settings(&settings);
        assert_eq!(rules.types, vec!["feat"]);
        assert_eq!(rules.max_header_length, 50);
        assert!(rules.validate("fix: x").is_err());
    }
}
