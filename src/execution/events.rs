//! Events emitted while a hook runs

use crate::core::{HookKind, RunStatus, Stage};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Events that can occur during a hook run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    RunStarted {
        run_id: Uuid,
        hook: HookKind,
        repository: PathBuf,
    },
    TargetStarted {
        stage: Stage,
        target: String,
        dry_run: bool,
    },
    TargetOutput {
        stage: Stage,
        target: String,
        stdout: String,
    },
    TargetFailed {
        stage: Stage,
        target: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    WorkDirCreated {
        path: PathBuf,
    },
    CheckedOut {
        branch: String,
        work_dir: PathBuf,
    },
    BuildfileUpdating {
        staged: PathBuf,
    },
    BuildfileAdopted {
        buildfile: PathBuf,
    },
    BuildfileRejected {
        target: String,
    },
    PushRejected,
    DeployCancelled,
    RunFinished {
        run_id: Uuid,
        hook: HookKind,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&HookEvent) + Send + Sync>;

/// Fan-out of events to registered handlers
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&HookEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push(Arc::new(handler));
        }
    }

    /// Emit an event to all handlers, in registration order
    pub fn emit(&self, event: HookEvent) {
        let handlers = match self.handlers.lock() {
            Ok(handlers) => handlers.clone(),
            Err(_) => return,
        };
        for handler in handlers.iter() {
            handler(&event);
        }
    }
}
