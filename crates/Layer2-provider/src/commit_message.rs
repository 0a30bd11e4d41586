//! Commit message generation from a staged diff

use crate::{CompletionRequest, Gateway, Message, ProviderError};
use commitwise_foundation::{AiSettings, CommitSettings};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Rules the generated message must follow, rendered into the system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageGuidelines {
    pub types: Vec<String>,
    pub scopes: Option<Vec<String>>,
    pub require_scope: bool,
    pub max_header_length: usize,
}

impl MessageGuidelines {
    pub fn from_settings(commit: &CommitSettings) -> Self {
        Self {
            types: commit.effective_types(),
            scopes: commit.effective_scopes(),
            require_scope: commit.effective_require_scope(),
            max_header_length: commit.effective_max_header_length(),
        }
    }

    fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You write git commit messages that follow the Conventional Commits 1.0.0 specification.\n\
             Reply with the commit message only: no explanations, no markdown, no code fences.\n\n\
             Format:\n<type>[(<scope>)][!]: <description>\n\n[optional body]\n\n[optional footers]\n\nRules:\n",
        );
        prompt.push_str(&format!("- type is one of: {}\n", self.types.join(", ")));
        match (&self.scopes, self.require_scope) {
            (Some(scopes), true) => {
                prompt.push_str(&format!("- scope is required, one of: {}\n", scopes.join(", ")))
            }
            (Some(scopes), false) => {
                prompt.push_str(&format!("- scope is optional, one of: {}\n", scopes.join(", ")))
            }
            (None, true) => prompt.push_str("- scope is required\n"),
            (None, false) => prompt.push_str("- scope is optional\n"),
        }
        prompt.push_str(&format!(
            "- the header line is at most {} characters\n\
             - the description is imperative, lower case, without a trailing period\n\
             - separate the body from the header with one blank line\n\
             - mark breaking changes with `!` and a `BREAKING CHANGE:` footer\n",
            self.max_header_length
        ));
        prompt
    }
}

/// Generates commit messages through a [`Gateway`]
pub struct CommitMessageGenerator {
    gateway: Gateway,
    guidelines: MessageGuidelines,
    max_diff_chars: usize,
}

impl CommitMessageGenerator {
    pub fn new(gateway: Gateway, guidelines: MessageGuidelines, max_diff_chars: usize) -> Self {
        Self {
            gateway,
            guidelines,
            max_diff_chars,
        }
    }

    pub fn from_settings(gateway: Gateway, commit: &CommitSettings, ai: &AiSettings) -> Self {
        Self::new(
            gateway,
            MessageGuidelines::from_settings(commit),
            ai.effective_max_diff_chars(),
        )
    }

    /// Build the request for `diff`, with an optional user hint
    pub fn build_request(&self, diff: &str, hint: Option<&str>) -> CompletionRequest {
        let (diff, truncated) = truncate_diff(diff, self.max_diff_chars);
        if truncated {
            debug!(max_chars = self.max_diff_chars, "diff truncated for prompt");
        }

        let mut user = String::new();
        if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
            user.push_str(&format!("Context from the author: {}\n\n", hint));
        }
        user.push_str("Staged changes:\n\n");
        user.push_str(diff);
        if truncated {
            user.push_str("\n\n[diff truncated]");
        }

        CompletionRequest::new(vec![Message::user(user)])
            .with_system(self.guidelines.system_prompt())
            .with_temperature(0.2)
    }

    /// Ask the provider for a message.
    ///
    /// Returns `ProviderError::Cancelled` as soon as `cancel` fires.
    pub async fn generate(
        &self,
        diff: &str,
        hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        if diff.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("staged diff is empty".to_string()));
        }

        let request = self.build_request(diff, hint);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            response = self.gateway.complete(&request, cancel) => response?,
        };

        info!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "commit message generated"
        );

        let message = clean_reply(&response.content);
        if message.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "provider returned an empty message".to_string(),
            ));
        }
        Ok(message)
    }
}

/// Cut `diff` to at most `max_chars` characters, never splitting a character
pub fn truncate_diff(diff: &str, max_chars: usize) -> (&str, bool) {
    match diff.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&diff[..byte_idx], true),
        None => (diff, false),
    }
}

/// Strip code fences, wrapping quotes and surrounding blank lines
pub fn clean_reply(reply: &str) -> String {
    let mut text = reply.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string (```text, ```git ...)
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text);
        text = text.trim();
    }

    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = text[1..text.len() - 1].trim();
        }
    }

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}
