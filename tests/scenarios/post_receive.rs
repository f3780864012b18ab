//! Test: Post-receive - checkout, buildfile update and deploy

use crate::helpers::*;
use cricic::core::{BuildfileUpdate, PipelineError, Stage, STAGED_BUILDFILE};
use cricic::execution::{HookEvent, RepositoryLock};
use cricic::persistence::InMemoryActionLog;
use std::sync::Arc;
use std::time::Duration;

const CONFIG: &str = "[pre]\ntargets = test\n[post]\ntargets = deploy\n";

#[tokio::test]
async fn test_deploy_runs_post_targets_in_work_dir() {
    let repo = TestRepo::new(CONFIG);
    let tool = ScriptedBuildTool::succeeding();
    let checkout = FakeCheckout::new();
    let engine = engine(tool.clone(), checkout.clone());

    let report = engine.post_receive(&repo.repository).await.unwrap();

    assert_eq!(report.branch, "master");
    assert_eq!(report.work_dir, repo.default_work_dir());
    assert_eq!(report.buildfile_update, BuildfileUpdate::NotStaged);
    assert_eq!(report.post.invoked(), vec!["deploy"]);

    // No staged buildfile, so no dry run of the pre targets
    assert_eq!(tool.targets(), vec!["deploy"]);
    assert_eq!(tool.calls()[0].invocation.working_dir, repo.default_work_dir());
    assert_eq!(
        checkout.calls(),
        vec![(repo.default_work_dir(), "master".to_string())]
    );
}

#[tokio::test]
async fn test_missing_work_dir_is_created() {
    let repo = TestRepo::new(CONFIG);
    let engine = engine(ScriptedBuildTool::succeeding(), FakeCheckout::new());
    let events = collect_events(&engine);
    assert!(!repo.default_work_dir().exists());

    let report = engine.post_receive(&repo.repository).await.unwrap();

    assert!(report.work_dir_created);
    assert!(repo.default_work_dir().is_dir());
    assert!(events.lock().unwrap().contains(&HookEvent::WorkDirCreated {
        path: repo.default_work_dir(),
    }));

    // Second deploy reuses it
    let report = engine.post_receive(&repo.repository).await.unwrap();
    assert!(!report.work_dir_created);
}

#[tokio::test]
async fn test_configured_work_dir_and_branch() {
    let repo = TestRepo::new(
        "[general]\nbranch = release\n[post]\ntargets = deploy\n[repository]\nwork_dir = ../www/site\n",
    );
    let tool = ScriptedBuildTool::succeeding();
    let checkout = FakeCheckout::new();
    let engine = engine(tool.clone(), checkout.clone());

    let report = engine.post_receive(&repo.repository).await.unwrap();

    let expected = repo.dir.path().join("www").join("site");
    assert_eq!(report.work_dir, expected);
    assert!(expected.is_dir());
    assert_eq!(checkout.calls(), vec![(expected.clone(), "release".to_string())]);
    assert_eq!(tool.calls()[0].invocation.working_dir, expected);
}

#[tokio::test]
async fn test_staged_buildfile_is_adopted() {
    let repo = TestRepo::new(CONFIG);
    let staged = "test:\n\t@echo new\ndeploy:\n\t@echo shipping\n";
    let tool = ScriptedBuildTool::succeeding();
    let checkout = FakeCheckout::new().with_file(STAGED_BUILDFILE, staged);
    let engine = engine(tool.clone(), checkout);
    let events = collect_events(&engine);

    let report = engine.post_receive(&repo.repository).await.unwrap();

    assert_eq!(report.buildfile_update, BuildfileUpdate::Adopted);
    assert_eq!(repo.buildfile_content(), staged);
    assert!(!repo.default_work_dir().join(STAGED_BUILDFILE).exists());
    assert!(RepositoryLock::acquire(repo.repository.lock_file(), Duration::ZERO)
        .await
        .is_ok());

    // Dry run of the pre targets in the repository, then the deploy
    let calls = tool.calls();
    assert_eq!(tool.targets(), vec!["test", "deploy"]);
    assert!(calls[0].invocation.dry_run);
    assert_eq!(calls[0].invocation.working_dir, repo.root());
    assert_eq!(calls[0].buildfile.as_deref(), Some(staged));
    assert!(!calls[1].invocation.dry_run);
    assert_eq!(calls[1].invocation.working_dir, repo.default_work_dir());
    assert_eq!(calls[1].buildfile.as_deref(), Some(staged));

    let events = events.lock().unwrap();
    assert!(events.contains(&HookEvent::BuildfileAdopted {
        buildfile: repo.repository.default_buildfile(),
    }));
}

#[tokio::test]
async fn test_broken_staged_buildfile_is_rolled_back() {
    let repo = TestRepo::new(CONFIG);
    let tool = ScriptedBuildTool::failing_on_buildfile("test", "broken");
    let checkout = FakeCheckout::new().with_file(STAGED_BUILDFILE, "broken:\n");
    let log = Arc::new(InMemoryActionLog::new());
    let engine = engine(tool.clone(), checkout).with_action_log(log.clone());
    let events = collect_events(&engine);

    let result = engine.post_receive(&repo.repository).await;

    match result {
        Err(PipelineError::BuildDescriptionInvalid { target }) => assert_eq!(target, "test"),
        other => panic!("expected a rejected buildfile, got {:?}", other),
    }
    assert_eq!(repo.buildfile_content(), ORIGINAL_BUILDFILE);
    assert!(!repo.default_work_dir().join(STAGED_BUILDFILE).exists());
    assert!(RepositoryLock::acquire(repo.repository.lock_file(), Duration::ZERO)
        .await
        .is_ok());

    // The deploy never ran
    assert_eq!(tool.targets(), vec!["test"]);
    assert!(tool.calls()[0].invocation.dry_run);

    let events = events.lock().unwrap();
    assert!(events.contains(&HookEvent::BuildfileRejected {
        target: "test".to_string(),
    }));
    assert!(!events.contains(&HookEvent::DeployCancelled));

    let lines = log.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(" ERROR [post-receive] FAILED ("));
}

#[tokio::test]
async fn test_staged_buildfile_with_unavailable_tool_is_rolled_back() {
    let repo = TestRepo::new(CONFIG);
    let tool = ScriptedBuildTool::unavailable();
    let checkout = FakeCheckout::new().with_file(STAGED_BUILDFILE, "test:\n");
    let engine = engine(tool, checkout);

    let result = engine.post_receive(&repo.repository).await;

    assert!(matches!(
        result,
        Err(PipelineError::BuildDescriptionInvalid { .. })
    ));
    assert_eq!(repo.buildfile_content(), ORIGINAL_BUILDFILE);
}

#[tokio::test]
async fn test_failing_post_target_cancels_the_deploy() {
    let repo = TestRepo::new("[post]\ntargets = build deploy notify\n");
    let tool = ScriptedBuildTool::with_exit_codes(&[("deploy", 3)]);
    let engine = engine(tool.clone(), FakeCheckout::new());
    let events = collect_events(&engine);

    let result = engine.post_receive(&repo.repository).await;

    match result {
        Err(PipelineError::TargetFailure { stage, target }) => {
            assert_eq!(stage, Stage::Post);
            assert_eq!(target, "deploy");
        }
        other => panic!("expected a target failure, got {:?}", other),
    }
    assert_eq!(tool.targets(), vec!["build", "deploy"]);
    assert!(events.lock().unwrap().contains(&HookEvent::DeployCancelled));
}

#[tokio::test]
async fn test_checkout_failure_stops_the_deploy() {
    let repo = TestRepo::new(CONFIG);
    let tool = ScriptedBuildTool::succeeding();
    let engine = engine(tool.clone(), FakeCheckout::failing());

    let result = engine.post_receive(&repo.repository).await;

    assert!(matches!(result, Err(PipelineError::CheckoutFailure(_))));
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn test_uninitialized_repository_is_not_deployed() {
    let repo = TestRepo::uninitialized();
    let tool = ScriptedBuildTool::succeeding();
    let checkout = FakeCheckout::new();
    let engine = engine(tool.clone(), checkout.clone());

    let result = engine.post_receive(&repo.repository).await;

    assert!(matches!(result, Err(PipelineError::NotInitialized(_))));
    assert!(checkout.calls().is_empty());
    assert!(tool.calls().is_empty());
    assert!(!repo.default_work_dir().exists());
}

#[tokio::test]
async fn test_locked_repository_keeps_the_buildfile() {
    let repo = TestRepo::new(CONFIG);
    let held = RepositoryLock::acquire(repo.repository.lock_file(), Duration::ZERO)
        .await
        .unwrap();
    let tool = ScriptedBuildTool::succeeding();
    let checkout = FakeCheckout::new().with_file(STAGED_BUILDFILE, "test:\n");
    let engine = engine(tool.clone(), checkout).with_lock_wait(Duration::from_millis(150));

    let result = engine.post_receive(&repo.repository).await;

    assert!(matches!(result, Err(PipelineError::Locked(_))));
    assert_eq!(repo.buildfile_content(), ORIGINAL_BUILDFILE);
    assert!(tool.calls().is_empty());
    drop(held);
}

#[tokio::test]
async fn test_leftover_lock_file_does_not_block_deploys() {
    let repo = TestRepo::new(CONFIG);
    // Left behind by a hook that was killed mid-update
    std::fs::write(repo.repository.lock_file(), "4242\n").unwrap();
    let staged = "test:\ndeploy:\n";
    let checkout = FakeCheckout::new().with_file(STAGED_BUILDFILE, staged);
    let engine = engine(ScriptedBuildTool::succeeding(), checkout).with_lock_wait(Duration::ZERO);

    let report = engine.post_receive(&repo.repository).await.unwrap();

    assert_eq!(report.buildfile_update, BuildfileUpdate::Adopted);
    assert_eq!(repo.buildfile_content(), staged);
}

#[tokio::test]
async fn test_config_error_during_dry_run_is_rolled_back() {
    let repo = TestRepo::new(CONFIG);
    let override_path = repo.dir.path().join("override.ini");
    std::fs::write(&override_path, "[pre]\nsilent = maybe\n").unwrap();
    let tool = ScriptedBuildTool::succeeding();
    let checkout = FakeCheckout::new().with_file(STAGED_BUILDFILE, "broken:\n");
    let engine = engine(tool.clone(), checkout).with_override(Some(override_path));

    let result = engine.post_receive(&repo.repository).await;

    assert!(matches!(result, Err(PipelineError::Config(_))));
    assert_eq!(repo.buildfile_content(), ORIGINAL_BUILDFILE);
    assert!(!repo.default_work_dir().join(STAGED_BUILDFILE).exists());
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn test_panicking_handler_during_dry_run_restores_buildfile() {
    let repo = TestRepo::new(CONFIG);
    let tool = ScriptedBuildTool::failing_on_buildfile("test", "broken");
    let checkout = FakeCheckout::new().with_file(STAGED_BUILDFILE, "broken:\n");
    let engine = engine(tool.clone(), checkout);
    engine.add_event_handler(|event| {
        if let HookEvent::TargetFailed { .. } = event {
            panic!("stdout closed");
        }
    });

    let repository = repo.repository.clone();
    let run = tokio::spawn(async move { engine.post_receive(&repository).await });
    let joined = run.await;

    assert!(joined.unwrap_err().is_panic());
    assert_eq!(repo.buildfile_content(), ORIGINAL_BUILDFILE);
    assert!(!repo.default_work_dir().join(STAGED_BUILDFILE).exists());
    assert_eq!(tool.targets(), vec!["test"]);

    // The lock went with the unwound run
    let lock = RepositoryLock::acquire(repo.repository.lock_file(), Duration::ZERO).await;
    assert!(lock.is_ok());
}
