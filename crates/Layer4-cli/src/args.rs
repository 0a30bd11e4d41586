//! Command line arguments

use clap::{Parser, Subcommand};
use commitwise_core::AutoStageMode;
use commitwise_foundation::{AutoStageSetting, CommitwiseConfig, ProviderSettings, ProviderType};
use std::path::PathBuf;

/// commitwise - Conventional Commits without losing your staging area
#[derive(Parser, Debug)]
#[command(name = "commitwise")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Stage modified tracked files before committing
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Also stage untracked files (implies --all)
    #[arg(short = 'u', long)]
    pub include_untracked: bool,

    /// Full commit message (skips the interactive prompts)
    #[arg(short, long, conflicts_with = "ai")]
    pub message: Option<String>,

    /// Commit type (feat, fix, ...)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub commit_type: Option<String>,

    /// Commit scope
    #[arg(short, long)]
    pub scope: Option<String>,

    /// Mark the commit as a breaking change
    #[arg(long)]
    pub breaking: bool,

    /// Generate the message with the configured AI provider
    #[arg(long)]
    pub ai: bool,

    /// Extra context passed to the AI provider
    #[arg(long, requires = "ai")]
    pub hint: Option<String>,

    /// Commit without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print the message instead of committing (staging is restored)
    #[arg(long)]
    pub dry_run: bool,

    /// Never try to sign the commit
    #[arg(long)]
    pub no_sign: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", value_name = "PATH", default_value = ".")]
    pub repo: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Seconds to wait for staging restoration after an interrupt
    #[arg(long, value_name = "SECS")]
    pub restore_timeout: Option<u64>,

    /// Provider to use (openai, anthropic, ollama)
    #[arg(long)]
    pub provider: Option<ProviderType>,

    /// Model to use
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Inspect or create configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a configuration file with every default filled in
    Init {
        /// Write `.commitwise.yaml` in the repository instead of the user file
        #[arg(long)]
        project: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Args {
    /// Flags win over the configured default mode
    pub fn auto_stage_mode(&self, default: AutoStageSetting) -> Option<AutoStageMode> {
        if self.include_untracked {
            return Some(AutoStageMode::ModifiedAndUntracked);
        }
        if self.all {
            return Some(AutoStageMode::ModifiedOnly);
        }
        match default {
            AutoStageSetting::None => None,
            AutoStageSetting::Modified => Some(AutoStageMode::ModifiedOnly),
            AutoStageSetting::All => Some(AutoStageMode::ModifiedAndUntracked),
        }
    }

    /// Apply flag overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut CommitwiseConfig) {
        if let Some(provider_type) = self.provider {
            config.provider.merge(ProviderSettings::new(provider_type));
        }
        if let Some(model) = &self.model {
            config.provider.model = Some(model.clone());
        }
        if self.no_sign {
            config.commit.sign = Some(false);
        }
        if let Some(secs) = self.restore_timeout {
            config.staging.restoration_timeout_secs = Some(secs);
        }
        if self.ai {
            config.ai.enabled = Some(true);
        }
        if self.yes {
            config.prompt.confirm = Some(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("commitwise").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_untracked_implies_all() {
        let args = parse(&["-u"]);
        assert_eq!(
            args.auto_stage_mode(AutoStageSetting::None),
            Some(AutoStageMode::ModifiedAndUntracked)
        );

        let args = parse(&["-a"]);
        assert_eq!(
            args.auto_stage_mode(AutoStageSetting::All),
            Some(AutoStageMode::ModifiedOnly)
        );
    }

    #[test]
    fn test_default_mode_from_config() {
        let args = parse(&[]);
        assert_eq!(args.auto_stage_mode(AutoStageSetting::None), None);
        assert_eq!(
            args.auto_stage_mode(AutoStageSetting::Modified),
            Some(AutoStageMode::ModifiedOnly)
        );
    }

    #[test]
    fn test_message_conflicts_with_ai() {
        let result = Args::try_parse_from(["commitwise", "-m", "feat: x", "--ai"]);
        assert!(result.is_err());

        let result = Args::try_parse_from(["commitwise", "--hint", "context"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--no-sign",
            "--restore-timeout",
            "2",
            "--provider",
            "ollama",
            "--model",
            "qwen2.5-coder",
            "--ai",
            "-y",
        ]);
        let mut config = CommitwiseConfig::default();
        args.apply_to(&mut config);

        assert!(!config.commit.effective_sign());
        assert_eq!(config.staging.effective_restoration_timeout(), 2);
        assert_eq!(config.provider.effective_type(), ProviderType::Ollama);
        assert_eq!(config.provider.effective_model(), "qwen2.5-coder");
        assert!(config.ai.effective_enabled());
        assert!(!config.prompt.effective_confirm());
    }

    #[test]
    fn test_config_subcommand() {
        let args = parse(&["config", "init", "--project", "--force"]);
        assert_eq!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Init {
                    project: true,
                    force: true
                }
            })
        );
        assert_eq!(parse(&["-C", "/tmp/repo"]).repo, PathBuf::from("/tmp/repo"));
    }
}
