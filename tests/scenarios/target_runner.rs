//! Test: Target Runner - ordering, fail-fast and tool flags

use crate::helpers::*;
use cricic::core::{EffectiveConfig, Repository, Stage, BUILTIN_CONFIG};
use cricic::execution::{EventBus, HookEvent, TargetRunner};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn config(local: &str) -> EffectiveConfig {
    let mut config = EffectiveConfig::parse(BUILTIN_CONFIG).unwrap();
    config.merge(EffectiveConfig::parse(local).unwrap());
    config
}

fn repository() -> Repository {
    Repository::new("/srv/git/site.git")
}

#[tokio::test]
async fn test_targets_run_in_order() {
    let tool = ScriptedBuildTool::succeeding();
    let runner = TargetRunner::new(tool.clone());
    let config = config("[pre]\ntargets = lint test build\n");

    let report = runner
        .run_targets(&repository(), &config, Stage::Pre, Path::new("/srv/git/site.git"), false, &EventBus::new())
        .await
        .unwrap();

    assert!(report.succeeded());
    assert_eq!(report.invoked(), vec!["lint", "test", "build"]);
    assert_eq!(tool.targets(), vec!["lint", "test", "build"]);
}

#[tokio::test]
async fn test_first_failure_stops_the_stage() {
    let tool = ScriptedBuildTool::with_exit_codes(&[("test", 1)]);
    let runner = TargetRunner::new(tool.clone());
    let config = config("[pre]\ntargets = lint test build\n");

    let report = runner
        .run_targets(&repository(), &config, Stage::Pre, Path::new("/srv/git/site.git"), false, &EventBus::new())
        .await
        .unwrap();

    assert!(!report.succeeded());
    assert_eq!(report.failed_target(), Some("test"));
    assert_eq!(report.results.last().unwrap().exit_code, Some(1));
    assert_eq!(tool.targets(), vec!["lint", "test"]);
}

#[tokio::test]
async fn test_blank_entries_are_skipped() {
    let tool = ScriptedBuildTool::succeeding();
    let runner = TargetRunner::new(tool.clone());
    let config = config("[post]\ntargets =  deploy   notify \n");

    runner
        .run_targets(&repository(), &config, Stage::Post, Path::new("/var/www"), false, &EventBus::new())
        .await
        .unwrap();

    assert_eq!(tool.targets(), vec!["deploy", "notify"]);
}

#[tokio::test]
async fn test_empty_target_list_runs_nothing() {
    let tool = ScriptedBuildTool::succeeding();
    let runner = TargetRunner::new(tool.clone());
    // `silent` is unparseable but never read without targets
    let config = config("[pre]\ntargets =\nsilent = maybe\n");

    let report = runner
        .run_targets(&repository(), &config, Stage::Pre, Path::new("/srv/git/site.git"), false, &EventBus::new())
        .await
        .unwrap();

    assert!(report.succeeded());
    assert!(report.results.is_empty());
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn test_invocation_flags_and_working_dir() {
    let tool = ScriptedBuildTool::succeeding();
    let runner = TargetRunner::new(tool.clone());
    let config = config("[pre]\ntargets = test\nsilent = yes\n");

    runner
        .run_targets(&repository(), &config, Stage::Pre, Path::new("/tmp/checkout"), true, &EventBus::new())
        .await
        .unwrap();

    let calls = tool.calls();
    assert_eq!(calls.len(), 1);
    let invocation = &calls[0].invocation;
    assert!(invocation.silent);
    assert!(invocation.dry_run);
    assert_eq!(invocation.working_dir, Path::new("/tmp/checkout"));
    assert_eq!(
        invocation.buildfile,
        Path::new("/srv/git/site.git/cricic/buildfile")
    );
    assert_eq!(
        invocation.args(),
        vec!["-f", "/srv/git/site.git/cricic/buildfile", "test", "-s", "-n"]
    );
}

#[tokio::test]
async fn test_unavailable_tool_counts_as_failure() {
    let tool = ScriptedBuildTool::unavailable();
    let runner = TargetRunner::new(tool.clone());
    let config = config("[pre]\ntargets = lint test\n");
    let events = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    let report = runner
        .run_targets(&repository(), &config, Stage::Pre, Path::new("/srv/git/site.git"), false, &events)
        .await
        .unwrap();

    assert_eq!(report.failed_target(), Some("lint"));
    assert_eq!(report.results[0].exit_code, None);
    assert_eq!(tool.targets(), vec!["lint"]);

    let seen = seen.lock().unwrap();
    assert!(seen.iter().any(|e| matches!(
        e,
        HookEvent::TargetFailed { target, exit_code: None, stderr, .. }
            if target == "lint" && stderr.contains("failed to run make")
    )));
}

#[tokio::test]
async fn test_output_events() {
    let tool = ScriptedBuildTool::with_exit_codes(&[("test", 2)]);
    let runner = TargetRunner::new(tool);
    let config = config("[pre]\ntargets = lint test\n");
    let events = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    runner
        .run_targets(&repository(), &config, Stage::Pre, Path::new("/srv/git/site.git"), false, &events)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            HookEvent::TargetStarted {
                stage: Stage::Pre,
                target: "lint".to_string(),
                dry_run: false,
            },
            HookEvent::TargetOutput {
                stage: Stage::Pre,
                target: "lint".to_string(),
                stdout: "ran lint".to_string(),
            },
            HookEvent::TargetStarted {
                stage: Stage::Pre,
                target: "test".to_string(),
                dry_run: false,
            },
            HookEvent::TargetOutput {
                stage: Stage::Pre,
                target: "test".to_string(),
                stdout: "ran test".to_string(),
            },
            HookEvent::TargetFailed {
                stage: Stage::Pre,
                target: "test".to_string(),
                exit_code: Some(2),
                stderr: "test broke".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_missing_stage_section_is_a_config_error() {
    let tool = ScriptedBuildTool::succeeding();
    let runner = TargetRunner::new(tool.clone());
    let config = EffectiveConfig::parse("[general]\nbuildfile = cricic/buildfile\n").unwrap();

    let result = runner
        .run_targets(&repository(), &config, Stage::Post, Path::new("/var/www"), false, &EventBus::new())
        .await;

    assert!(matches!(result, Err(cricic::core::PipelineError::Config(_))));
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn test_timeout_is_passed_to_every_target() {
    let tool = ScriptedBuildTool::succeeding();
    let runner = TargetRunner::new(tool.clone());
    let config = config("[general]\ntimeout = 90\n[pre]\ntargets = lint test\n");

    runner
        .run_targets(&repository(), &config, Stage::Pre, Path::new("/srv/git/site.git"), false, &EventBus::new())
        .await
        .unwrap();

    for call in tool.calls() {
        assert_eq!(call.invocation.timeout, Some(Duration::from_secs(90)));
    }
    assert_eq!(tool.calls().len(), 2);
}
