//! Abort-path scenarios: capture → auto-stage → abort → restore

use commitwise_core::{
    AutoStageMode, CancellationToken, GitOperations, InMemoryGit, StagingSession,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn set(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn validation_rejected_unstages_everything_auto_staged() {
    let git = Arc::new(InMemoryGit::default().with_modified(["a.go", "b.go"]));
    let session = StagingSession::new(git.clone());
    let cancel = CancellationToken::new();

    let pre = session.capture(&cancel).await.unwrap();
    assert!(pre.is_empty());

    let result = session
        .auto_stage(AutoStageMode::ModifiedOnly, &cancel)
        .await
        .unwrap();
    assert!(result.is_success());
    assert_eq!(git.staged(), set(&["a.go", "b.go"]));

    // message rejected by validation: abort
    let plan = session.restore().await.unwrap();
    assert_eq!(plan.files_to_unstage(), &set(&["a.go", "b.go"]));
    assert!(git.staged().is_empty());
}

#[tokio::test]
async fn pre_existing_staged_file_survives_restore() {
    let git = Arc::new(
        InMemoryGit::default()
            .with_staged(["a.go"])
            .with_modified(["b.go"]),
    );
    let session = StagingSession::new(git.clone());
    let cancel = CancellationToken::new();

    session.capture(&cancel).await.unwrap();
    session
        .auto_stage(AutoStageMode::ModifiedOnly, &cancel)
        .await
        .unwrap();

    let plan = session.restore().await.unwrap();
    assert_eq!(plan.files_to_unstage(), &set(&["b.go"]));
    assert_eq!(git.staged(), set(&["a.go"]));
}

#[tokio::test]
async fn failed_file_leaves_nothing_from_the_batch() {
    let git = Arc::new(
        InMemoryGit::default()
            .with_modified(["a.go", "b.go", "c.go"])
            .fail_stage_on("c.go"),
    );
    let session = StagingSession::new(git.clone());
    let cancel = CancellationToken::new();

    session.capture(&cancel).await.unwrap();
    let result = session
        .auto_stage(AutoStageMode::ModifiedOnly, &cancel)
        .await
        .unwrap();

    assert!(!result.is_success());
    assert!(result.staged_files.is_empty());
    assert_eq!(result.failed_files.len(), 1);
    assert_eq!(result.failed_files[0].path, "c.go");
    assert!(!result.failed_files[0].reason.is_empty());

    // nothing remains from this call, so the plan is empty
    let unstage_calls = git.unstage_calls();
    let plan = session.restore().await.unwrap();
    assert!(plan.is_empty());
    assert_eq!(git.unstage_calls(), unstage_calls);
    assert!(git.staged().is_empty());
}

#[tokio::test]
async fn capture_is_a_faithful_snapshot() {
    let git = Arc::new(
        InMemoryGit::default()
            .with_staged(["x.rs", "y.rs"])
            .with_partially_staged(["z.rs"])
            .with_untracked(["u.rs"]),
    );
    let session = StagingSession::new(git.clone());
    let cancel = CancellationToken::new();

    let state = session.capture(&cancel).await.unwrap();
    let live = git.read_staging_state(&cancel).await.unwrap();
    assert_eq!(state.staged_files(), &live);
}

#[tokio::test]
async fn files_staged_out_of_band_during_run_are_rolled_back() {
    let git = Arc::new(
        InMemoryGit::default()
            .with_staged(["keep.rs"])
            .with_modified(["a.rs", "other.rs"])
            .with_untracked(["new.rs"]),
    );
    let session = StagingSession::new(git.clone());
    let cancel = CancellationToken::new();

    session.capture(&cancel).await.unwrap();
    session
        .auto_stage(AutoStageMode::ModifiedOnly, &cancel)
        .await
        .unwrap();
    git.stage_externally("new.rs");

    let plan = session.restore().await.unwrap();
    assert_eq!(plan.files_to_unstage(), &set(&["a.rs", "new.rs", "other.rs"]));
    assert_eq!(git.staged(), set(&["keep.rs"]));
}

#[tokio::test]
async fn successful_commit_path_needs_no_restoration() {
    let git = Arc::new(InMemoryGit::default().with_modified(["a.rs"]));
    let session = StagingSession::new(git.clone());
    let cancel = CancellationToken::new();

    session.capture(&cancel).await.unwrap();
    session
        .auto_stage(AutoStageMode::ModifiedOnly, &cancel)
        .await
        .unwrap();
    git.create_commit("feat: a", false, &cancel).await.unwrap();

    assert!(!session.restore_attempted());
    assert_eq!(git.unstage_calls(), 0);
    assert_eq!(git.commits()[0].files, set(&["a.rs"]));
}
