//! Building and editing commit messages from flags and answers

use commitwise_core::{CommitRules, ConventionalCommit};

/// Where the commit message comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource {
    /// `-m`: used verbatim, never re-prompted
    Explicit(String),
    /// Type/scope from flags or prompts, description prompted
    Composed {
        commit_type: Option<String>,
        scope: Option<String>,
        breaking: bool,
    },
    /// Generated from the staged diff
    Ai { hint: Option<String> },
}

/// Render a header-only message
pub fn compose(commit_type: &str, scope: Option<&str>, breaking: bool, description: &str) -> String {
    let mut commit = ConventionalCommit::new(commit_type, description).with_breaking(breaking);
    if let Some(scope) = scope {
        commit = commit.with_scope(scope);
    }
    commit.to_string()
}

/// Swap the first line, keeping body and footers
pub fn replace_header(message: &str, header: &str) -> String {
    match message.split_once('\n') {
        Some((_, rest)) => format!("{}\n{}", header.trim(), rest),
        None => header.trim().to_string(),
    }
}

/// Check a type answer against the configured list
pub fn parse_type(rules: &CommitRules, answer: &str) -> Result<String, String> {
    if rules.types.iter().any(|t| t == answer) {
        Ok(answer.to_string())
    } else {
        Err(format!(
            "unknown type '{}': expected one of {}",
            answer,
            rules.types.join(", ")
        ))
    }
}

/// Check a scope answer; blank means "no scope"
pub fn parse_scope(rules: &CommitRules, answer: &str) -> Result<Option<String>, String> {
    if answer.is_empty() {
        return if rules.require_scope {
            Err("a scope is required".to_string())
        } else {
            Ok(None)
        };
    }
    match &rules.scopes {
        Some(allowed) if !allowed.iter().any(|s| s == answer) => Err(format!(
            "scope '{}' is not allowed: expected one of {}",
            answer,
            allowed.join(", ")
        )),
        _ => Ok(Some(answer.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> CommitRules {
        CommitRules {
            types: vec!["feat".into(), "fix".into()],
            scopes: Some(vec!["api".into()]),
            require_scope: false,
            max_header_length: 72,
        }
    }

    #[test]
    fn test_compose() {
        assert_eq!(compose("feat", Some("api"), false, "add x"), "feat(api): add x");
        assert_eq!(compose("fix", None, true, "drop y"), "fix!: drop y");
        assert_eq!(compose("fix", Some(""), false, "z"), "fix: z");
    }

    #[test]
    fn test_replace_header_keeps_body() {
        assert_eq!(
            replace_header("feat: old\n\nbody\n\nRefs: #1", "feat: new"),
            "feat: new\n\nbody\n\nRefs: #1"
        );
        assert_eq!(replace_header("feat: old", " fix: new "), "fix: new");
    }

    #[test]
    fn test_parse_type_and_scope() {
        assert_eq!(parse_type(&rules(), "feat"), Ok("feat".to_string()));
        assert!(parse_type(&rules(), "feature").is_err());

        assert_eq!(parse_scope(&rules(), ""), Ok(None));
        assert_eq!(parse_scope(&rules(), "api"), Ok(Some("api".to_string())));
        assert!(parse_scope(&rules(), "web").is_err());

        let strict = CommitRules {
            require_scope: true,
            ..rules()
        };
        assert!(parse_scope(&strict, "").is_err());
    }
}
