//! Interactive prompts
//!
//! Every read is raced against the workflow's cancellation token, and
//! re-asking on invalid input is a bounded loop.

use crate::ui;
use async_trait::async_trait;
use commitwise_core::CancellationToken;
use std::io::{self, BufRead};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input cancelled")]
    Cancelled,

    #[error("input closed")]
    Closed,

    #[error("no valid answer after {0} attempts")]
    AttemptsExhausted(u32),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of answers to questions
#[async_trait]
pub trait Prompter: Send {
    /// Ask `question` and return the answer without its line ending
    async fn read_line(
        &mut self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError>;
}

/// Prompter reading from stdin.
///
/// Lines are read on a dedicated thread and handed over through a channel.
/// A read that is abandoned on cancellation stays on that thread, so it
/// never holds up runtime shutdown.
#[derive(Default)]
pub struct TerminalPrompter {
    lines: Option<mpsc::Receiver<io::Result<String>>>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the reader thread on first use
    fn lines(&mut self) -> Result<&mut mpsc::Receiver<io::Result<String>>, PromptError> {
        if self.lines.is_none() {
            self.lines = Some(spawn_stdin_reader()?);
        }
        self.lines.as_mut().ok_or(PromptError::Closed)
    }
}

/// One line per message; the sender is dropped at EOF
fn spawn_stdin_reader() -> io::Result<mpsc::Receiver<io::Result<String>>> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = io::stdin();
            loop {
                let mut line = String::new();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.blocking_send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.blocking_send(Err(e));
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn read_line(
        &mut self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError> {
        let lines = self.lines()?;
        ui::question(question);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PromptError::Cancelled),
            line = lines.recv() => match line {
                None => Err(PromptError::Closed),
                Some(line) => Ok(line?.trim_end_matches(['\r', '\n']).to_string()),
            },
        }
    }
}

/// Ask until `parse` accepts the answer, at most `max_attempts` times
pub async fn ask_valid<T, P, F>(
    prompter: &mut P,
    question: &str,
    max_attempts: u32,
    cancel: &CancellationToken,
    mut parse: F,
) -> Result<T, PromptError>
where
    P: Prompter + ?Sized,
    F: FnMut(&str) -> Result<T, String>,
{
    for attempt in 1..=max_attempts {
        let answer = prompter.read_line(question, cancel).await?;
        match parse(answer.trim()) {
            Ok(value) => return Ok(value),
            Err(reason) => {
                tracing::debug!(attempt, reason = %reason, "invalid answer");
                ui::warn(&reason);
            }
        }
    }
    Err(PromptError::AttemptsExhausted(max_attempts))
}

/// Answer to the final confirmation question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accept,
    Edit,
    Regenerate,
    Abort,
}

impl Confirmation {
    pub const QUESTION: &'static str = "Commit with this message? [Y]es / [e]dit / [r]egenerate / [n]o";

    pub fn parse(answer: &str) -> Result<Self, String> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "" | "y" | "yes" => Ok(Self::Accept),
            "e" | "edit" => Ok(Self::Edit),
            "r" | "regenerate" => Ok(Self::Regenerate),
            "n" | "no" | "a" | "abort" => Ok(Self::Abort),
            other => Err(format!("unrecognised answer '{}': use y, e, r or n", other)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::scripted::ScriptedPrompter;
    use super::*;

    fn number(answer: &str) -> Result<u32, String> {
        answer.parse().map_err(|_| format!("'{}' is not a number", answer))
    }

    #[tokio::test]
    async fn test_ask_valid_retries_until_valid() {
        let mut prompter = ScriptedPrompter::new(["x", " 7 "]);
        let value = ask_valid(&mut prompter, "n?", 3, &CancellationToken::new(), number)
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(prompter.questions.len(), 2);
    }

    #[tokio::test]
    async fn test_ask_valid_is_bounded() {
        let mut prompter = ScriptedPrompter::new(["a", "b", "c", "4"]);
        let result = ask_valid(&mut prompter, "n?", 3, &CancellationToken::new(), number).await;
        assert!(matches!(result, Err(PromptError::AttemptsExhausted(3))));
        assert_eq!(prompter.questions.len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_prompt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut prompter = ScriptedPrompter::new(["1"]);
        let result = ask_valid(&mut prompter, "n?", 3, &cancel, number).await;
        assert!(matches!(result, Err(PromptError::Cancelled)));
    }

    #[test]
    fn test_confirmation_parse() {
        assert_eq!(Confirmation::parse(""), Ok(Confirmation::Accept));
        assert_eq!(Confirmation::parse("E"), Ok(Confirmation::Edit));
        assert_eq!(Confirmation::parse("regenerate"), Ok(Confirmation::Regenerate));
        assert_eq!(Confirmation::parse("n"), Ok(Confirmation::Abort));
        assert!(Confirmation::parse("maybe").is_err());
    }
}
