//! Hook engine - the pre-receive validator and the post-receive deploy

use crate::{
    build::BuildTool,
    core::{
        BuildfileUpdate, ConfigResolver, EffectiveConfig, HookKind, PipelineError, Repository,
        RunStatus, RunSummary, Stage, StageReport, STAGED_BUILDFILE,
    },
    execution::{BuildfileSwap, Checkout, EventBus, HookEvent, RepositoryLock, TargetRunner},
    persistence::{ActionLog, ActionLogEntry},
};
use chrono::Utc;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// How long a deploy waits for another run's buildfile update
const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(30);

/// Outcome of a successful post-receive run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub branch: String,
    pub work_dir: PathBuf,
    pub work_dir_created: bool,
    pub buildfile_update: BuildfileUpdate,
    pub post: StageReport,
}

/// Runs the server-side hooks of one repository
pub struct HookEngine<T, C> {
    runner: TargetRunner<T>,
    checkout: C,
    resolver: ConfigResolver,
    override_path: Option<PathBuf>,
    action_log: Option<Arc<dyn ActionLog>>,
    events: EventBus,
    lock_wait: Duration,
}

impl<T: BuildTool, C: Checkout> HookEngine<T, C> {
    pub fn new(tool: T, checkout: C, resolver: ConfigResolver) -> Self {
        Self {
            runner: TargetRunner::new(tool),
            checkout,
            resolver,
            override_path: None,
            action_log: None,
            events: EventBus::new(),
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }

    /// Config file read after every other layer
    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    /// Record the outcome of every run in `log`
    pub fn with_action_log(mut self, log: Arc<dyn ActionLog>) -> Self {
        self.action_log = Some(log);
        self
    }

    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(&HookEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler);
    }

    pub fn runner(&self) -> &TargetRunner<T> {
        &self.runner
    }

    pub fn checkout(&self) -> &C {
        &self.checkout
    }

    /// Pre-receive: decide whether the push is accepted
    ///
    /// Fails with `NotInitialized` before reading any configuration if the
    /// repository was not set up, and with `TargetFailure` when a `pre`
    /// target fails. Any error means the push must be rejected.
    pub async fn pre_receive(&self, repository: &Repository) -> Result<StageReport, PipelineError> {
        self.record(HookKind::PreReceive, repository, self.validate_push(repository), |_| {
            "push accepted".to_string()
        })
        .await
    }

    /// Post-receive: check out the pushed branch and deploy it
    ///
    /// A staged `.cricicbuild` in the work tree replaces the buildfile only
    /// if the `pre` targets pass a dry run with it; otherwise the previous
    /// buildfile is restored and the deploy stops before `post`.
    pub async fn post_receive(&self, repository: &Repository) -> Result<DeployReport, PipelineError> {
        self.record(HookKind::PostReceive, repository, self.deploy(repository), |report| {
            format!("deployed {} to {}", report.branch, report.work_dir.display())
        })
        .await
    }

    async fn validate_push(&self, repository: &Repository) -> Result<StageReport, PipelineError> {
        repository.ensure_initialized()?;
        let config = self.resolve(repository)?;
        repository.ensure_buildfile(&config)?;

        let report = self
            .runner
            .run_targets(repository, &config, Stage::Pre, repository.root(), false, &self.events)
            .await?;

        if let Some(target) = report.failed_target() {
            self.events.emit(HookEvent::PushRejected);
            return Err(PipelineError::TargetFailure {
                stage: Stage::Pre,
                target: target.to_string(),
            });
        }

        info!("Push accepted");
        Ok(report)
    }

    async fn deploy(&self, repository: &Repository) -> Result<DeployReport, PipelineError> {
        repository.ensure_initialized()?;
        let config = self.resolve(repository)?;
        repository.ensure_buildfile(&config)?;

        let work_dir = repository.work_dir(&config)?;
        let work_dir_created = !work_dir.is_dir();
        if work_dir_created {
            std::fs::create_dir_all(&work_dir).map_err(|e| PipelineError::io(&work_dir, e))?;
            self.events.emit(HookEvent::WorkDirCreated {
                path: work_dir.clone(),
            });
        }

        let branch = config.get("general", "branch")?.to_string();
        self.checkout
            .checkout(repository.root(), &work_dir, &branch)
            .await?;
        self.events.emit(HookEvent::CheckedOut {
            branch: branch.clone(),
            work_dir: work_dir.clone(),
        });

        let buildfile_update = self.apply_staged_buildfile(repository, &config, &work_dir).await?;

        let post = self
            .runner
            .run_targets(repository, &config, Stage::Post, &work_dir, false, &self.events)
            .await?;

        if let Some(target) = post.failed_target() {
            self.events.emit(HookEvent::DeployCancelled);
            return Err(PipelineError::TargetFailure {
                stage: Stage::Post,
                target: target.to_string(),
            });
        }

        Ok(DeployReport {
            branch,
            work_dir,
            work_dir_created,
            buildfile_update,
            post,
        })
    }

    /// Swap in a staged buildfile if the work tree carries one
    ///
    /// The whole swap-validate-restore sequence holds the repository lock.
    /// The swap restores the previous bytes unless it is committed, so on
    /// every path out of here (errors and unwinding included) the staged
    /// file is gone and the live buildfile is either the validated staged
    /// bytes or the previous bytes.
    async fn apply_staged_buildfile(
        &self,
        repository: &Repository,
        config: &EffectiveConfig,
        work_dir: &Path,
    ) -> Result<BuildfileUpdate, PipelineError> {
        let staged = work_dir.join(STAGED_BUILDFILE);
        if !staged.is_file() {
            return Ok(BuildfileUpdate::NotStaged);
        }

        self.events.emit(HookEvent::BuildfileUpdating {
            staged: staged.clone(),
        });
        let _lock = RepositoryLock::acquire(repository.lock_file(), self.lock_wait).await?;

        let buildfile = repository.buildfile(config)?;
        let swap = BuildfileSwap::begin(&buildfile, &staged)?;

        let validation = self
            .runner
            .run_targets(repository, config, Stage::Pre, repository.root(), true, &self.events)
            .await;

        let rejection = match validation {
            Ok(report) => report
                .failed_target()
                .map(|target| PipelineError::BuildDescriptionInvalid {
                    target: target.to_string(),
                }),
            Err(e) => Some(e),
        };

        if let Some(err) = rejection {
            warn!("Staged buildfile rejected, restoring {}", buildfile.display());
            swap.rollback()?;
            if let PipelineError::BuildDescriptionInvalid { target } = &err {
                self.events.emit(HookEvent::BuildfileRejected {
                    target: target.clone(),
                });
            }
            return Err(err);
        }

        swap.commit()?;
        info!("Adopted staged buildfile {}", buildfile.display());
        self.events.emit(HookEvent::BuildfileAdopted { buildfile });
        Ok(BuildfileUpdate::Adopted)
    }

    fn resolve(&self, repository: &Repository) -> Result<EffectiveConfig, PipelineError> {
        Ok(self
            .resolver
            .resolve(repository, self.override_path.as_deref())?)
    }

    /// Run `work` with a run id, emit start/finish events, log the outcome
    async fn record<R, F, D>(
        &self,
        hook: HookKind,
        repository: &Repository,
        work: F,
        describe: D,
    ) -> Result<R, PipelineError>
    where
        F: Future<Output = Result<R, PipelineError>>,
        D: FnOnce(&R) -> String,
    {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        self.events.emit(HookEvent::RunStarted {
            run_id,
            hook,
            repository: repository.root().to_path_buf(),
        });

        let span = info_span!("hook", %run_id, %hook);
        let result = work.instrument(span).await;

        let (status, message) = match &result {
            Ok(value) => (RunStatus::Succeeded, describe(value)),
            Err(e) => (RunStatus::Failed, e.to_string()),
        };
        self.events.emit(HookEvent::RunFinished {
            run_id,
            hook,
            status,
        });

        let summary = RunSummary {
            run_id,
            hook,
            status,
            started_at,
            finished_at: Utc::now(),
            message,
        };
        self.write_action_log(repository, &summary);

        result
    }

    fn write_action_log(&self, repository: &Repository, summary: &RunSummary) {
        let Some(log) = &self.action_log else {
            return;
        };
        // The log lives in cricic/, which only exists once initialized
        if !repository.config_dir().is_dir() {
            return;
        }
        if let Err(e) = log.append(&ActionLogEntry::from_summary(summary)) {
            warn!("Failed to write action log: {}", e);
        }
    }
}
