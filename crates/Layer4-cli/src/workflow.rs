//! Commit workflow
//!
//! capture → auto-stage → message → confirm → commit. Every path that does
//! not end in a commit restores the staging area, once.

use crate::message::{compose, parse_scope, parse_type, replace_header, MessageSource};
use crate::prompt::{ask_valid, Confirmation, PromptError, Prompter};
use crate::ui;
use commitwise_core::{
    AutoStageMode, CancellationToken, CommitOutcome, CommitRules, Committer, GitError,
    StagingError, StagingSession,
};
use commitwise_provider::{CommitMessageGenerator, ProviderError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the workflow needs besides its collaborators
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub auto_stage: Option<AutoStageMode>,
    pub source: MessageSource,
    pub rules: CommitRules,
    pub sign: bool,
    pub confirm: bool,
    pub dry_run: bool,
    /// Bound on re-prompts, regenerations and confirmation rounds
    pub max_attempts: u32,
}

/// Why a run ended without a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    Cancelled,
    UserAborted,
    /// No message passed validation
    Rejected(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestorationReport {
    /// Nothing was captured, so nothing was touched
    NotNeeded,
    Restored { unstaged: usize },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Committed(CommitOutcome),
    NothingToCommit,
    DryRun {
        message: String,
        restoration: RestorationReport,
    },
    Aborted {
        reason: AbortReason,
        restoration: RestorationReport,
    },
}

impl WorkflowOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            WorkflowOutcome::Aborted { .. } => 1,
            _ => 0,
        }
    }
}

impl From<StagingError> for AbortReason {
    fn from(err: StagingError) -> Self {
        match &err {
            StagingError::StagingFailed(GitError::Cancelled)
            | StagingError::RepositoryUnavailable {
                source: GitError::Cancelled,
                ..
            } => AbortReason::Cancelled,
            _ => AbortReason::Failed(err.to_string()),
        }
    }
}

impl From<GitError> for AbortReason {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Cancelled => AbortReason::Cancelled,
            other => AbortReason::Failed(other.to_string()),
        }
    }
}

impl From<PromptError> for AbortReason {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Cancelled => AbortReason::Cancelled,
            PromptError::Closed => AbortReason::UserAborted,
            PromptError::AttemptsExhausted(_) => AbortReason::Rejected(err.to_string()),
            PromptError::Io(e) => AbortReason::Failed(e.to_string()),
        }
    }
}

impl From<ProviderError> for AbortReason {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Cancelled => AbortReason::Cancelled,
            other => AbortReason::Failed(format!("AI provider: {}", other)),
        }
    }
}

enum Finished {
    Committed(CommitOutcome),
    NothingToCommit,
    DryRun(String),
}

pub struct Workflow<P> {
    session: Arc<StagingSession>,
    options: WorkflowOptions,
    prompter: P,
    generator: Option<CommitMessageGenerator>,
}

impl<P: Prompter> Workflow<P> {
    pub fn new(session: Arc<StagingSession>, options: WorkflowOptions, prompter: P) -> Self {
        Self {
            session,
            options,
            prompter,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: CommitMessageGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Run to completion. Never returns before restoration has been attempted
    /// on an abort path.
    pub async fn run(&mut self, cancel: &CancellationToken) -> WorkflowOutcome {
        match self.drive(cancel).await {
            Ok(Finished::Committed(outcome)) => WorkflowOutcome::Committed(outcome),
            Ok(Finished::NothingToCommit) => WorkflowOutcome::NothingToCommit,
            Ok(Finished::DryRun(message)) => {
                let restoration = self.restore().await;
                WorkflowOutcome::DryRun {
                    message,
                    restoration,
                }
            }
            Err(reason) => {
                let reason = if cancel.is_cancelled() {
                    AbortReason::Cancelled
                } else {
                    reason
                };
                info!(reason = ?reason, "aborting");
                let restoration = self.restore().await;
                WorkflowOutcome::Aborted {
                    reason,
                    restoration,
                }
            }
        }
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<Finished, AbortReason> {
        let pre = self.session.capture(cancel).await?;
        debug!(staged = pre.len(), "pre-run staging state captured");

        if let Some(mode) = self.options.auto_stage {
            let result = self.session.auto_stage(mode, cancel).await?;
            if result.aborted {
                return Err(AbortReason::Cancelled);
            }
            if !result.is_success() {
                for failure in &result.failed_files {
                    ui::error(&format!("could not stage {}", failure));
                }
                return Err(AbortReason::Failed(format!(
                    "{} file(s) could not be staged",
                    result.failed_files.len()
                )));
            }
            if !result.skipped_files.is_empty() {
                ui::info(&format!(
                    "left {} file(s) with staged changes as they are",
                    result.skipped_files.len()
                ));
            }
            if !result.staged_files.is_empty() {
                ui::info(&format!("staged {} file(s)", result.staged_files.len()));
            }
        }

        let staged = self.session.git().read_staging_state(cancel).await?;
        if staged.is_empty() {
            ui::info("nothing to commit");
            return Ok(Finished::NothingToCommit);
        }

        let mut message = self.obtain_message(cancel).await?;
        if self.options.confirm {
            message = self.confirm(message, cancel).await?;
        }

        if self.options.dry_run {
            return Ok(Finished::DryRun(message));
        }

        let outcome = Committer::new(self.session.git().clone(), self.options.sign)
            .commit(&message, cancel)
            .await?;
        Ok(Finished::Committed(outcome))
    }

    async fn obtain_message(&mut self, cancel: &CancellationToken) -> Result<String, AbortReason> {
        match self.options.source.clone() {
            MessageSource::Explicit(message) => {
                let message = message.trim().to_string();
                self.options
                    .rules
                    .validate(&message)
                    .map_err(|e| AbortReason::Rejected(e.to_string()))?;
                Ok(message)
            }
            MessageSource::Composed {
                commit_type,
                scope,
                breaking,
            } => self.compose(commit_type, scope, breaking, cancel).await,
            MessageSource::Ai { hint } => self.generate(hint.as_deref(), cancel).await,
        }
    }

    async fn compose(
        &mut self,
        commit_type: Option<String>,
        scope: Option<String>,
        breaking: bool,
        cancel: &CancellationToken,
    ) -> Result<String, AbortReason> {
        let rules = self.options.rules.clone();
        let attempts = self.options.max_attempts;

        let commit_type = match commit_type {
            Some(t) => parse_type(&rules, &t).map_err(AbortReason::Rejected)?,
            None => {
                let question = format!("Type ({}):", rules.types.join(", "));
                ask_valid(&mut self.prompter, &question, attempts, cancel, |answer| {
                    parse_type(&rules, answer)
                })
                .await?
            }
        };

        let scope = match scope {
            Some(s) => parse_scope(&rules, &s).map_err(AbortReason::Rejected)?,
            None => {
                let question = if rules.require_scope {
                    "Scope:"
                } else {
                    "Scope (blank for none):"
                };
                ask_valid(&mut self.prompter, question, attempts, cancel, |answer| {
                    parse_scope(&rules, answer)
                })
                .await?
            }
        };

        let message = ask_valid(&mut self.prompter, "Description:", attempts, cancel, |answer| {
            let message = compose(&commit_type, scope.as_deref(), breaking, answer);
            rules
                .validate(&message)
                .map(|_| message)
                .map_err(|e| e.to_string())
        })
        .await?;
        Ok(message)
    }

    async fn generate(
        &self,
        hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, AbortReason> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            AbortReason::Failed("AI generation requested but no provider is configured".into())
        })?;
        let diff = self.session.git().staged_diff(cancel).await?;

        for attempt in 1..=self.options.max_attempts {
            ui::info("generating commit message...");
            let message = generator.generate(&diff, hint, cancel).await?;
            match self.options.rules.validate(&message) {
                Ok(_) => return Ok(message),
                Err(e) => {
                    warn!(attempt, error = %e, "generated message rejected");
                    ui::warn(&format!("generated message rejected: {}", e));
                }
            }
        }
        Err(AbortReason::Rejected(format!(
            "no valid message after {} attempts",
            self.options.max_attempts
        )))
    }

    async fn confirm(
        &mut self,
        mut message: String,
        cancel: &CancellationToken,
    ) -> Result<String, AbortReason> {
        let attempts = self.options.max_attempts;

        for _ in 0..attempts {
            ui::preview(&message);
            let answer = ask_valid(
                &mut self.prompter,
                Confirmation::QUESTION,
                attempts,
                cancel,
                Confirmation::parse,
            )
            .await?;

            match answer {
                Confirmation::Accept => return Ok(message),
                Confirmation::Abort => return Err(AbortReason::UserAborted),
                Confirmation::Edit => {
                    let rules = self.options.rules.clone();
                    let current = message.clone();
                    message = ask_valid(&mut self.prompter, "New header:", attempts, cancel, |header| {
                        let edited = replace_header(&current, header);
                        rules
                            .validate(&edited)
                            .map(|_| edited)
                            .map_err(|e| e.to_string())
                    })
                    .await?;
                }
                Confirmation::Regenerate => {
                    message = self.obtain_message(cancel).await?;
                }
            }
        }
        Err(AbortReason::Rejected(format!(
            "no message accepted after {} rounds",
            attempts
        )))
    }

    async fn restore(&self) -> RestorationReport {
        if self.session.pre_cli_state().is_none() {
            return RestorationReport::NotNeeded;
        }
        match self.session.restore().await {
            Ok(plan) => {
                ui::success("Staging area restored to its pre-run state.");
                RestorationReport::Restored {
                    unstaged: plan.files_to_unstage().len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "restoration failed");
                ui::warn(&format!(
                    "Could not restore the staging area ({}); check `git status` and manually restore if needed",
                    e
                ));
                RestorationReport::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::scripted::ScriptedPrompter;
    use async_trait::async_trait;
    use commitwise_core::InMemoryGit;
    use commitwise_provider::{
        CompletionRequest, FinishReason, Gateway, MessageGuidelines, Provider, ProviderMetadata,
        ProviderResponse, RetryConfig, TokenUsage,
    };
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    fn options(source: MessageSource) -> WorkflowOptions {
        WorkflowOptions {
            auto_stage: Some(AutoStageMode::ModifiedOnly),
            source,
            rules: CommitRules::default(),
            sign: true,
            confirm: false,
            dry_run: false,
            max_attempts: 3,
        }
    }

    fn explicit(message: &str) -> MessageSource {
        MessageSource::Explicit(message.to_string())
    }

    fn composed() -> MessageSource {
        MessageSource::Composed {
            commit_type: None,
            scope: None,
            breaking: false,
        }
    }

    fn workflow(
        git: &Arc<InMemoryGit>,
        options: WorkflowOptions,
        answers: &[&str],
    ) -> Workflow<ScriptedPrompter> {
        let session = Arc::new(StagingSession::new(git.clone()));
        Workflow::new(session, options, ScriptedPrompter::new(answers.iter().copied()))
    }

    fn repo() -> Arc<InMemoryGit> {
        Arc::new(
            InMemoryGit::default()
                .with_staged(["pre.rs"])
                .with_modified(["a.rs", "b.rs"]),
        )
    }

    #[tokio::test]
    async fn test_explicit_message_commits() {
        let git = repo();
        let mut wf = workflow(&git, options(explicit("feat(core): add a")), &[]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(&outcome, WorkflowOutcome::Committed(o) if o.signed));
        assert_eq!(outcome.exit_code(), 0);

        let commits = git.commits();
        assert_eq!(commits[0].message, "feat(core): add a");
        assert_eq!(commits[0].files, set(&["a.rs", "b.rs", "pre.rs"]));
        assert_eq!(git.unstage_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejected_message_restores_staging() {
        let git = repo();
        let mut wf = workflow(&git, options(explicit("added some stuff")), &[]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(
            &outcome,
            WorkflowOutcome::Aborted {
                reason: AbortReason::Rejected(_),
                restoration: RestorationReport::Restored { unstaged: 2 },
            }
        ));
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(git.staged(), set(&["pre.rs"]));
        assert!(git.commits().is_empty());
    }

    #[tokio::test]
    async fn test_composed_interactively() {
        let git = repo();
        let mut wf = workflow(&git, options(composed()), &["feature", "feat", "api", "add login"]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(outcome, WorkflowOutcome::Committed(_)));
        assert_eq!(git.commits()[0].message, "feat(api): add login");
        assert_eq!(wf.prompter.questions.len(), 4);
    }

    #[tokio::test]
    async fn test_user_abort_at_confirmation() {
        let git = repo();
        let mut opts = options(composed());
        opts.confirm = true;
        let mut wf = workflow(&git, opts, &["fix", "", "handle empty input", "n"]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(
            outcome,
            WorkflowOutcome::Aborted {
                reason: AbortReason::UserAborted,
                ..
            }
        ));
        assert_eq!(git.staged(), set(&["pre.rs"]));
    }

    #[tokio::test]
    async fn test_edit_header_keeps_body() {
        let git = repo();
        let mut opts = options(explicit("feat: first try\n\nLonger explanation."));
        opts.confirm = true;
        let mut wf = workflow(&git, opts, &["e", "fix: better header", "y"]);

        wf.run(&CancellationToken::new()).await;
        assert_eq!(
            git.commits()[0].message,
            "fix: better header\n\nLonger explanation."
        );
    }

    #[tokio::test]
    async fn test_closed_input_aborts_and_restores() {
        let git = repo();
        let mut wf = workflow(&git, options(composed()), &["feat"]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(
            outcome,
            WorkflowOutcome::Aborted {
                reason: AbortReason::UserAborted,
                restoration: RestorationReport::Restored { .. },
            }
        ));
        assert_eq!(git.staged(), set(&["pre.rs"]));
    }

    #[tokio::test]
    async fn test_nothing_to_commit() {
        let git = Arc::new(InMemoryGit::default().with_untracked(["new.rs"]));
        let mut wf = workflow(&git, options(explicit("feat: x")), &[]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert_eq!(outcome, WorkflowOutcome::NothingToCommit);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(git.commit_calls(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_restores() {
        let git = repo();
        let mut opts = options(explicit("docs: explain flags"));
        opts.dry_run = true;
        let mut wf = workflow(&git, opts, &[]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert_eq!(
            outcome,
            WorkflowOutcome::DryRun {
                message: "docs: explain flags".into(),
                restoration: RestorationReport::Restored { unstaged: 2 },
            }
        );
        assert_eq!(git.staged(), set(&["pre.rs"]));
        assert!(git.commits().is_empty());
    }

    #[tokio::test]
    async fn test_stage_failure_aborts() {
        let git = Arc::new(
            InMemoryGit::default()
                .with_modified(["a.rs", "b.rs"])
                .fail_stage_on("b.rs"),
        );
        let mut wf = workflow(&git, options(explicit("feat: x")), &[]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(
            outcome,
            WorkflowOutcome::Aborted {
                reason: AbortReason::Failed(_),
                ..
            }
        ));
        assert!(git.staged().is_empty());
    }

    #[tokio::test]
    async fn test_signing_unsupported_falls_back() {
        let git = Arc::new(
            InMemoryGit::default()
                .with_modified(["a.rs"])
                .with_signing_unsupported(),
        );
        let mut wf = workflow(&git, options(explicit("chore: bump")), &[]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(outcome, WorkflowOutcome::Committed(o) if !o.signed));
    }

    /// Cancels the run the moment a question is asked
    struct CancellingPrompter(CancellationToken);

    #[async_trait]
    impl Prompter for CancellingPrompter {
        async fn read_line(
            &mut self,
            _question: &str,
            cancel: &CancellationToken,
        ) -> Result<String, PromptError> {
            self.0.cancel();
            cancel.cancelled().await;
            Err(PromptError::Cancelled)
        }
    }

    #[tokio::test]
    async fn test_cancel_during_prompt_restores() {
        let git = repo();
        let cancel = CancellationToken::new();
        let session = Arc::new(StagingSession::new(git.clone()));
        let mut wf = Workflow::new(
            session.clone(),
            options(composed()),
            CancellingPrompter(cancel.clone()),
        );

        let outcome = wf.run(&cancel).await;
        assert_eq!(
            outcome,
            WorkflowOutcome::Aborted {
                reason: AbortReason::Cancelled,
                restoration: RestorationReport::Restored { unstaged: 2 },
            }
        );
        assert!(session.restore_attempted());
        assert_eq!(git.staged(), set(&["pre.rs"]));
    }

    struct ReplyQueue {
        metadata: ProviderMetadata,
        replies: Mutex<Vec<String>>,
    }

    impl ReplyQueue {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                metadata: ProviderMetadata {
                    id: "queue".into(),
                    display_name: "Queue".into(),
                    model: "test".into(),
                    base_url: String::new(),
                    api_key_env: None,
                },
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl Provider for ReplyQueue {
        fn metadata(&self) -> &ProviderMetadata {
            &self.metadata
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let content = self.replies.lock().unwrap().pop().unwrap_or_default();
            Ok(ProviderResponse {
                content,
                usage: TokenUsage::default(),
                finish_reason: FinishReason::Stop,
                model: "test".into(),
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn generator(provider: Arc<ReplyQueue>) -> CommitMessageGenerator {
        let gateway = Gateway::new(provider).with_retry_config(RetryConfig::no_retry());
        let guidelines = MessageGuidelines {
            types: CommitRules::default().types,
            scopes: None,
            require_scope: false,
            max_header_length: 72,
        };
        CommitMessageGenerator::new(gateway, guidelines, 4000)
    }

    #[tokio::test]
    async fn test_ai_regenerates_invalid_message() {
        let git = repo();
        let provider = ReplyQueue::new(&["Updated files.", "```\nrefactor: split parser\n```"]);
        let mut wf = workflow(&git, options(MessageSource::Ai { hint: None }), &[])
            .with_generator(generator(provider));

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(outcome, WorkflowOutcome::Committed(_)));
        assert_eq!(git.commits()[0].message, "refactor: split parser");
    }

    #[tokio::test]
    async fn test_ai_gives_up_after_bound() {
        let git = repo();
        let provider = ReplyQueue::new(&["nope", "still nope", "no", "feat: too late"]);
        let mut wf = workflow(&git, options(MessageSource::Ai { hint: None }), &[])
            .with_generator(generator(provider));

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(
            outcome,
            WorkflowOutcome::Aborted {
                reason: AbortReason::Rejected(_),
                ..
            }
        ));
        assert_eq!(git.staged(), set(&["pre.rs"]));
    }

    #[tokio::test]
    async fn test_ai_without_provider_fails() {
        let git = repo();
        let mut wf = workflow(&git, options(MessageSource::Ai { hint: None }), &[]);

        let outcome = wf.run(&CancellationToken::new()).await;
        assert!(matches!(
            outcome,
            WorkflowOutcome::Aborted {
                reason: AbortReason::Failed(_),
                ..
            }
        ));
    }
}
