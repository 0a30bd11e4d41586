//! commitwise-core: Core Runtime for commitwise
//!
//! Layer2 - git 작업과 staging 수명주기
//!
//! # 주요 모듈
//!
//! - `git`: `GitOperations` capability, `GitCli` 구현, status 파싱
//! - `staging`: 실행 전 staging 스냅샷, 자동 staging, 복원
//! - `cancel`: 인터럽트 시그널 단일 처리 + 복원 대기 시간 제한
//! - `commit`: Conventional Commits 모델/검증, 서명 커밋
//!
//! # 사용 예시
//!
//! ```ignore
//! use commitwise_core::{GitCli, StagingSession, AutoStageMode};
//!
//! let git = Arc::new(GitCli::discover(".", Duration::from_secs(30)).await?);
//! let session = StagingSession::new(git);
//!
//! session.capture(&cancel).await?;
//! let result = session.auto_stage(AutoStageMode::ModifiedOnly, &cancel).await?;
//! if !result.is_success() {
//!     session.restore().await?;
//! }
//! ```

pub mod cancel;
pub mod commit;
pub mod git;
pub mod staging;

// Re-exports: Git
pub use git::{GitCli, GitError, GitOperations, GitStatus, StatusEntry};
#[cfg(any(test, feature = "test-util"))]
pub use git::{InMemoryGit, MemoryCommit};

// Re-exports: Staging
pub use staging::{
    AutoStageMode, AutoStager, AutoStagingResult, RestorationPlan, RestorationPlanner,
    StagingError, StagingFailure, StagingSession, StagingState, StagingStateCapturer,
};

// Re-exports: Cancellation
pub use cancel::{
    CancellationCoordinator, ChannelSignals, CoordinatorState, InterruptKind, OsSignals,
    RestorationNotifier, RestorationOutcome, SignalSender, SignalSource, Termination,
    DEFAULT_RESTORATION_TIMEOUT,
};

// Re-exports: Commit
pub use commit::{CommitOutcome, CommitRules, Committer, ConventionalCommit, Footer, ValidationError};

// Re-exports: cancellation token type used across the API
pub use tokio_util::sync::CancellationToken;
