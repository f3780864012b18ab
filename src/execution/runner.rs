//! Target runner - runs the targets of one stage through the build tool

use crate::{
    build::{target_timeout, BuildOutput, BuildTool, Invocation},
    core::{EffectiveConfig, PipelineError, Repository, Stage, StageReport, TargetResult},
    execution::{EventBus, HookEvent},
};
use std::path::Path;
use tracing::{debug, info, warn};

/// Runs configured targets one at a time, stopping at the first failure
pub struct TargetRunner<T> {
    tool: T,
}

impl<T: BuildTool> TargetRunner<T> {
    pub fn new(tool: T) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Run every target of `stage` in `working_dir`
    ///
    /// Targets run in the listed order. Stdout of every target is relayed;
    /// the first target exiting non-zero has its stderr relayed and ends the
    /// stage. A build tool that cannot be started counts as a failing
    /// target. An empty target list succeeds without running anything.
    ///
    /// # Errors
    /// Only configuration lookups fail the call itself; target failures are
    /// reported through [`StageReport::succeeded`].
    pub async fn run_targets(
        &self,
        repository: &Repository,
        config: &EffectiveConfig,
        stage: Stage,
        working_dir: &Path,
        dry_run: bool,
        events: &EventBus,
    ) -> Result<StageReport, PipelineError> {
        let targets = stage.targets(config)?;
        let mut report = StageReport::new(stage, dry_run);

        if targets.is_empty() {
            debug!("No targets configured for stage {}", stage);
            return Ok(report);
        }

        let silent = stage.silent(config)?;
        let timeout = target_timeout(config)?;

        for target in targets {
            events.emit(HookEvent::TargetStarted {
                stage,
                target: target.clone(),
                dry_run,
            });

            let invocation = Invocation {
                buildfile: repository.buildfile(config)?,
                target: target.clone(),
                silent,
                dry_run,
                working_dir: working_dir.to_path_buf(),
                timeout,
            };

            let output = match self.tool.run(&invocation).await {
                Ok(output) => output,
                Err(e) => {
                    warn!("Build tool error for target {}: {}", target, e);
                    BuildOutput {
                        exit_code: None,
                        stdout: Vec::new(),
                        stderr: e.to_string().into_bytes(),
                    }
                }
            };

            events.emit(HookEvent::TargetOutput {
                stage,
                target: target.clone(),
                stdout: output.stdout_text(),
            });

            let success = output.success();
            report.results.push(TargetResult {
                target: target.clone(),
                exit_code: output.exit_code,
                success,
            });

            if !success {
                warn!("Target {} failed in stage {}", target, stage);
                events.emit(HookEvent::TargetFailed {
                    stage,
                    target,
                    exit_code: output.exit_code,
                    stderr: output.stderr_text(),
                });
                return Ok(report);
            }
        }

        info!("Stage {} completed: {} target(s)", stage, report.results.len());
        Ok(report)
    }
}
