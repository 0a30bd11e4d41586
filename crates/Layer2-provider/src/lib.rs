//! # commitwise-provider
//!
//! AI provider abstraction layer for commitwise.
//! Generates Conventional Commits messages from a staged diff.
//!
//! ## Features
//! - Automatic retry with exponential backoff (cancellable)
//! - Multiple provider support (OpenAI, Anthropic, Ollama)
//! - Every request is raced against the workflow's cancellation token

pub mod commit_message;
pub mod error;
pub mod gateway;
pub mod message;
pub mod providers;
pub mod retry;
pub mod r#trait;

// Core traits and types
pub use gateway::{build_provider, Gateway};
pub use message::{Message, MessageRole};
pub use r#trait::{
    CompletionRequest, FinishReason, Provider, ProviderMetadata, ProviderResponse, TokenUsage,
};

// Commit message generation
pub use commit_message::{clean_reply, truncate_diff, CommitMessageGenerator, MessageGuidelines};

// Error and retry
pub use error::ProviderError;
pub use retry::RetryConfig;

// Provider implementations
pub use providers::anthropic::AnthropicProvider;
pub use providers::ollama::OllamaProvider;
pub use providers::openai::OpenAiProvider;
