//! commitwise CLI - Main entry point

mod args;
mod config_cmd;
mod message;
mod prompt;
mod ui;
mod workflow;

use anyhow::Context;
use args::{Args, Command};
use clap::Parser;
use commitwise_core::{
    CancellationCoordinator, CommitRules, GitCli, GitOperations, OsSignals, StagingSession,
    Termination,
};
use commitwise_foundation::{CommitwiseConfig, ConfigLoader};
use commitwise_provider::{CommitMessageGenerator, Gateway};
use message::MessageSource;
use prompt::TerminalPrompter;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workflow::{AbortReason, Workflow, WorkflowOptions, WorkflowOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging (stderr; stdout is reserved for --dry-run output)
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Handle subcommands first
    if let Some(Command::Config { action }) = &args.command {
        return match config_cmd::run(action, &args.repo) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                ui::error(&format!("{:#}", e));
                ExitCode::from(1)
            }
        };
    }

    // 인덱스를 건드리기 전에 시그널 핸들러부터 설치
    let signals = match OsSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            ui::error(&format!("failed to install signal handlers: {}", e));
            return ExitCode::from(1);
        }
    };

    match commit(args, signals).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            ui::error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}

/// Load configuration, then race the workflow against the interrupt supervisor
async fn commit(args: Args, signals: OsSignals) -> anyhow::Result<u8> {
    // the git timeout can come from user settings before the repository is known
    let user_config = ConfigLoader::new(None).load_all()?;
    let git = GitCli::discover(
        &args.repo,
        Duration::from_secs(user_config.staging.effective_git_timeout()),
    )
    .await
    .with_context(|| format!("cannot open repository at {}", args.repo.display()))?;

    let mut config = ConfigLoader::new(Some(git.repository_root())).load_all()?;
    args.apply_to(&mut config);
    let git = git.with_timeout(Duration::from_secs(config.staging.effective_git_timeout()));

    let options = workflow_options(&args, &config);
    let generator = match options.source {
        MessageSource::Ai { .. } => Some(generator(&config)?),
        _ => None,
    };

    let restoration_timeout = Duration::from_secs(config.staging.effective_restoration_timeout());
    let (coordinator, notifier) = CancellationCoordinator::new(restoration_timeout);
    let cancel = coordinator.token();

    let session = Arc::new(StagingSession::new(Arc::new(git)));
    let mut workflow = Workflow::new(session, options, TerminalPrompter::new());
    if let Some(generator) = generator {
        workflow = workflow.with_generator(generator);
    }

    let supervisor = coordinator.supervise(signals);
    let work = async {
        let outcome = workflow.run(&cancel).await;
        notifier.notify();
        outcome
    };
    tokio::pin!(supervisor, work);

    let code = tokio::select! {
        outcome = &mut work => {
            if coordinator.signal_received() {
                match supervisor.await {
                    Some(termination) => interrupted(termination),
                    None => report(outcome),
                }
            } else {
                report(outcome)
            }
        }
        termination = &mut supervisor => match termination {
            Some(termination) => interrupted(termination),
            // no signal can arrive any more; just finish the work
            None => report(work.await),
        },
    };
    Ok(code)
}

fn workflow_options(args: &Args, config: &CommitwiseConfig) -> WorkflowOptions {
    let source = if let Some(message) = &args.message {
        MessageSource::Explicit(message.clone())
    } else if config.ai.effective_enabled() {
        MessageSource::Ai {
            hint: args.hint.clone(),
        }
    } else {
        MessageSource::Composed {
            commit_type: args.commit_type.clone(),
            scope: args.scope.clone(),
            breaking: args.breaking,
        }
    };

    WorkflowOptions {
        auto_stage: args.auto_stage_mode(config.staging.effective_default_mode()),
        source,
        rules: CommitRules::from_settings(&config.commit),
        sign: config.commit.effective_sign(),
        confirm: config.prompt.effective_confirm(),
        dry_run: args.dry_run,
        max_attempts: config.prompt.effective_max_attempts(),
    }
}

fn generator(config: &CommitwiseConfig) -> anyhow::Result<CommitMessageGenerator> {
    let gateway = Gateway::from_settings(&config.provider).with_context(|| {
        format!(
            "AI provider '{}' is not usable",
            config.provider.effective_type()
        )
    })?;
    Ok(CommitMessageGenerator::from_settings(
        gateway,
        &config.commit,
        &config.ai,
    ))
}

fn report(outcome: WorkflowOutcome) -> u8 {
    match &outcome {
        WorkflowOutcome::Committed(commit) => {
            if commit.signed {
                ui::success(&format!("created signed commit {}", commit.hash));
            } else {
                ui::success(&format!("created commit {}", commit.hash));
            }
        }
        WorkflowOutcome::NothingToCommit => {}
        WorkflowOutcome::DryRun { message, .. } => println!("{}", message),
        WorkflowOutcome::Aborted { reason, .. } => match reason {
            AbortReason::Cancelled => ui::warn("cancelled"),
            AbortReason::UserAborted => ui::warn("aborted"),
            AbortReason::Rejected(why) | AbortReason::Failed(why) => ui::error(why),
        },
    }
    outcome.exit_code()
}

fn interrupted(termination: Termination) -> u8 {
    if termination.timed_out() {
        ui::warn(&format!(
            "Interrupted by {}; staging restoration did not finish in time. Check `git status` and manually restore if needed.",
            termination.signal
        ));
    } else {
        ui::warn(&format!("Interrupted by {}", termination.signal));
    }
    termination.exit_code()
}
