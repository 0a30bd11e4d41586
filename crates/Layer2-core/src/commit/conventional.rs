//! Conventional Commits message model
//!
//! `type(scope)!: description`, optional body, optional footers.

use std::fmt;

use super::validate::ValidationError;

const BREAKING_TOKENS: &[&str] = &["BREAKING CHANGE", "BREAKING-CHANGE"];

/// Trailer line such as `Refs: #123` or `BREAKING CHANGE: ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub token: String,
    pub value: String,
    /// Written as `Token #value`
    hash_form: bool,
}

impl Footer {
    pub fn new(token: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            value: value.into(),
            hash_form: false,
        }
    }

    pub fn is_breaking(&self) -> bool {
        BREAKING_TOKENS.contains(&self.token.as_str())
    }

    fn parse(line: &str) -> Option<Self> {
        for token in BREAKING_TOKENS {
            if let Some(value) = line.strip_prefix(token).and_then(|r| r.strip_prefix(": ")) {
                return Some(Self::new(*token, value.trim()));
            }
        }

        // `Token: value` or `Token #value`; tokens use `-` for whitespace
        let (token, value, hash_form) = match line.split_once(": ") {
            Some((token, value)) => (token, value.trim().to_string(), false),
            None => {
                let (token, value) = line.split_once(" #")?;
                (token, format!("#{}", value.trim()), true)
            }
        };
        let valid_token = !token.is_empty()
            && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_token || value.trim_start_matches('#').is_empty() {
            return None;
        }
        Some(Self {
            token: token.to_string(),
            value,
            hash_form,
        })
    }
}

impl fmt::Display for Footer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hash_form {
            write!(f, "{} {}", self.token, self.value)
        } else {
            write!(f, "{}: {}", self.token, self.value)
        }
    }
}

/// A parsed Conventional Commits message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
    pub commit_type: String,
    pub scope: Option<String>,
    /// `!` marker in the header
    pub breaking: bool,
    pub description: String,
    pub body: Option<String>,
    pub footers: Vec<Footer>,
}

impl ConventionalCommit {
    pub fn new(commit_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            commit_type: commit_type.into(),
            scope: None,
            breaking: false,
            description: description.into(),
            body: None,
            footers: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.scope = if scope.trim().is_empty() {
            None
        } else {
            Some(scope)
        };
        self
    }

    pub fn with_breaking(mut self, breaking: bool) -> Self {
        self.breaking = breaking;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body = if body.trim().is_empty() {
            None
        } else {
            Some(body.trim().to_string())
        };
        self
    }

    pub fn with_footer(mut self, footer: Footer) -> Self {
        self.footers.push(footer);
        self
    }

    /// Breaking via `!` or a `BREAKING CHANGE` footer
    pub fn is_breaking(&self) -> bool {
        self.breaking || self.footers.iter().any(Footer::is_breaking)
    }

    pub fn header(&self) -> String {
        let mut header = self.commit_type.clone();
        if let Some(scope) = &self.scope {
            header.push('(');
            header.push_str(scope);
            header.push(')');
        }
        if self.breaking {
            header.push('!');
        }
        header.push_str(": ");
        header.push_str(&self.description);
        header
    }

    /// Parse the syntax only; rule checks live in `CommitRules`
    pub fn parse(message: &str) -> Result<Self, ValidationError> {
        let message = message.trim_matches(|c| c == '\n' || c == '\r');
        if message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        let mut lines = message.lines();
        let header = lines.next().unwrap_or_default().trim_end();
        let (commit_type, scope, breaking, description) = parse_header(header)?;

        let rest: Vec<&str> = lines.collect();
        let (body, footers) = match rest.split_first() {
            None => (None, Vec::new()),
            Some((first, _)) if !first.trim().is_empty() => {
                return Err(ValidationError::MissingBlankLine)
            }
            Some((_, tail)) => split_body_and_footers(&tail.join("\n")),
        };

        Ok(Self {
            commit_type,
            scope,
            breaking,
            description,
            body,
            footers,
        })
    }
}

fn parse_header(header: &str) -> Result<(String, Option<String>, bool, String), ValidationError> {
    let malformed = || ValidationError::MalformedHeader(header.to_string());

    let (prefix, description) = header.split_once(':').ok_or_else(malformed)?;
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    let description = description.strip_prefix(' ').ok_or_else(malformed)?.trim();

    let (prefix, breaking) = match prefix.strip_suffix('!') {
        Some(p) => (p, true),
        None => (prefix, false),
    };

    let (commit_type, scope) = match prefix.split_once('(') {
        Some((ty, rest)) => {
            let scope = rest.strip_suffix(')').ok_or_else(malformed)?;
            if scope.trim().is_empty() {
                return Err(ValidationError::EmptyScope);
            }
            if scope.contains(['(', ')']) {
                return Err(malformed());
            }
            (ty, Some(scope.trim().to_string()))
        }
        None => (prefix, None),
    };

    if commit_type.is_empty()
        || !commit_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(malformed());
    }

    Ok((
        commit_type.to_string(),
        scope,
        breaking,
        description.to_string(),
    ))
}

/// The last paragraph is the footer block when every line in it is a footer
fn split_body_and_footers(text: &str) -> (Option<String>, Vec<Footer>) {
    let text = text.trim_matches('\n');
    if text.trim().is_empty() {
        return (None, Vec::new());
    }

    let (head, last) = match text.rfind("\n\n") {
        Some(idx) => (Some(&text[..idx]), &text[idx + 2..]),
        None => (None, text),
    };

    let footers: Option<Vec<Footer>> = last.lines().map(Footer::parse).collect();
    match footers {
        Some(footers) if !footers.is_empty() => {
            let body = head
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty());
            (body, footers)
        }
        _ => (Some(text.trim().to_string()), Vec::new()),
    }
}

impl fmt::Display for ConventionalCommit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header())?;
        if let Some(body) = &self.body {
            write!(f, "\n\n{}", body)?;
        }
        if !self.footers.is_empty() {
            f.write_str("\n")?;
            for footer in &self.footers {
                write!(f, "\n{}", footer)?;
            }
        }
        Ok(())
    }
}
