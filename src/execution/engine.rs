//! Main execution engine - runs a workflow's steps in order

use crate::{
    actions::StepAction,
    core::{Event, ExecutionStatus, RunEnvironment, StepReport, StepState, WorkflowRun},
    execution::{ExecutionResult, RunFiles, StepContext, StepExecutor},
    shell::{CommandRunner, OutputCallback},
};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        workflow_name: String,
        event: Event,
        total_steps: usize,
    },
    StepStarted {
        step_id: String,
        name: String,
        index: usize,
    },
    /// One line of stdout, sent while the step is still running
    StepOutput {
        step_id: String,
        output: String,
    },
    StepCompleted {
        step_id: String,
        report: StepReport,
    },
    StepFailed {
        step_id: String,
        error: String,
        /// `continue-on-error` was set, the run is not failed
        tolerated: bool,
    },
    StepSkipped {
        step_id: String,
        reason: String,
    },
    RunCompleted {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Turns the running step's stdout lines into `StepOutput` events
struct StepOutputForwarder {
    step_id: String,
    handlers: Vec<EventHandler>,
}

impl OutputCallback for StepOutputForwarder {
    fn on_line(&self, line: &str) {
        for handler in &self.handlers {
            handler(ExecutionEvent::StepOutput {
                step_id: self.step_id.clone(),
                output: line.to_string(),
            });
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("run {0} has already been executed")]
    AlreadyStarted(Uuid),

    #[error("run files unavailable: {0}")]
    RunFiles(#[from] std::io::Error),
}

/// Workflow execution engine
pub struct ExecutionEngine<R> {
    executor: Arc<StepExecutor<R>>,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
    working_dir: PathBuf,
    skip_debug_sessions: bool,
}

impl<R: CommandRunner + 'static> ExecutionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            executor: Arc::new(StepExecutor::new(runner)),
            event_handlers: Arc::new(Mutex::new(Vec::new())),
            working_dir: PathBuf::from("."),
            skip_debug_sessions: false,
        }
    }

    /// Directory commands run in
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Never open interactive debug sessions (unattended runs)
    pub fn skip_debug_sessions(mut self, skip: bool) -> Self {
        self.skip_debug_sessions = skip;
        self
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    fn runner_env(&self, run: &WorkflowRun, files: &RunFiles) -> HashMap<String, String> {
        let mut env = files.env_vars();
        env.insert("CI".to_string(), "true".to_string());
        env.insert("RUNNER_RUN_ID".to_string(), run.state.run_id.to_string());
        env.insert("RUNNER_WORKFLOW".to_string(), run.workflow_name.clone());
        env.insert("RUNNER_EVENT".to_string(), run.state.event.kind.to_string());
        env.insert("RUNNER_BRANCH".to_string(), run.state.event.branch.clone());
        env
    }

    /// Execute every step of the run, in declaration order
    pub async fn execute(&self, run: &mut WorkflowRun) -> Result<ExecutionStatus, EngineError> {
        let run_id = run.state.run_id;
        if run.state.status != ExecutionStatus::Pending {
            return Err(EngineError::AlreadyStarted(run_id));
        }

        let files = RunFiles::create()?;
        let runner_env = self.runner_env(run, &files);

        let mut env = RunEnvironment::new(&self.working_dir);
        for (key, value) in &run.env {
            env.set_variable(key.clone(), value.clone());
        }

        info!(
            "Starting workflow: {} ({}) on {} to {}",
            run.workflow_name, run_id, run.state.event.kind, run.state.event.branch
        );
        self.emit_event(ExecutionEvent::RunStarted {
            run_id,
            workflow_name: run.workflow_name.clone(),
            event: run.state.event.clone(),
            total_steps: run.steps.len(),
        })
        .await;

        run.state.start(run.steps.len());

        for index in 0..run.steps.len() {
            let run_failed = run.has_failed();
            let step = run.steps[index].clone();

            let skip_reason = if !step.should_run(run_failed) {
                Some(format!("condition {} not met", step.condition))
            } else if self.skip_debug_sessions && matches!(step.action, StepAction::DebugSession(_)) {
                Some("debug sessions disabled".to_string())
            } else {
                None
            };

            if let Some(reason) = skip_reason {
                info!("Skipping step {}: {}", step.id, reason);
                run.steps[index].state = StepState::Skipped {
                    reason: reason.clone(),
                };
                run.update_counts();
                self.emit_event(ExecutionEvent::StepSkipped {
                    step_id: step.id.clone(),
                    reason,
                })
                .await;
                continue;
            }

            let started_at = Utc::now();
            run.steps[index].state = StepState::Running { started_at };
            self.emit_event(ExecutionEvent::StepStarted {
                step_id: step.id.clone(),
                name: step.name.clone(),
                index,
            })
            .await;

            files.reset()?;

            let variables = env.rendering_variables(&run.variables);
            let ctx = StepContext {
                shell: run.shell,
                variables: &variables,
                runner_env: &runner_env,
            };

            let forwarder = StepOutputForwarder {
                step_id: step.id.clone(),
                handlers: self.event_handlers.lock().await.clone(),
            };
            let result = self
                .executor
                .execute(&step, &mut env, ctx, Some(&forwarder))
                .await;
            let (mut report, failure) = match result {
                ExecutionResult::Success { report } => (report, None),
                ExecutionResult::Failed { error, report } => (report, Some(error)),
            };

            match files.apply(&mut env) {
                Ok(notes) => report.notes.extend(notes),
                Err(e) => warn!("Could not read run files after step {}: {}", step.id, e),
            }

            env.set_step_output(&step.id, report.output.clone());

            match failure {
                None => {
                    run.steps[index].state = StepState::Completed {
                        report: report.clone(),
                        started_at,
                        completed_at: Utc::now(),
                    };
                    self.emit_event(ExecutionEvent::StepCompleted {
                        step_id: step.id.clone(),
                        report,
                    })
                    .await;
                }
                Some(error) => {
                    if step.continue_on_error {
                        warn!("Step {} failed, continuing: {}", step.id, error);
                    } else {
                        error!("Step {} failed: {}", step.id, error);
                    }
                    run.steps[index].state = StepState::Failed {
                        error: error.clone(),
                        report,
                        started_at,
                        failed_at: Utc::now(),
                    };
                    self.emit_event(ExecutionEvent::StepFailed {
                        step_id: step.id.clone(),
                        error,
                        tolerated: step.continue_on_error,
                    })
                    .await;
                }
            }

            run.update_counts();
        }

        let status = if run.has_failed() {
            run.state.fail();
            ExecutionStatus::Failed
        } else {
            run.state.complete();
            ExecutionStatus::Completed
        };

        info!("Workflow {} finished: {:?}", run.workflow_name, status);
        self.emit_event(ExecutionEvent::RunCompleted { run_id, status })
            .await;

        Ok(status)
    }
}
