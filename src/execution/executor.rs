//! Step executor - runs the commands of a single step

use crate::{
    actions::{CommandSpec, ExitPolicy},
    core::{CommandOutcome, CommandRecord, RunEnvironment, Step, StepReport},
    shell::{CommandOutput, CommandRunner, Invocation, OutputCallback, Shell},
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Result of executing a step
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// Step completed successfully
    Success { report: StepReport },
    /// Step failed
    Failed { error: String, report: StepReport },
}

/// What happened to a command that did not fail its step
#[derive(Debug, Clone)]
pub enum Execution {
    /// Guard not met
    Skipped,
    /// Exited zero, or exited non-zero under an advisory policy
    Finished(CommandOutput),
}

/// A fatal command failure
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub message: String,
    /// Output, when the command ran at all
    pub output: Option<CommandOutput>,
}

/// Run-wide inputs every step needs
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub shell: Shell,
    /// Values for `{{ name }}` substitution
    pub variables: &'a HashMap<String, String>,
    /// Variables exported by the runner itself (run id, path/env files)
    pub runner_env: &'a HashMap<String, String>,
}

/// Command execution scoped to one step
///
/// Evaluates guards, applies exit policies and records every command in the
/// step report.
pub struct CommandSession<'a> {
    runner: &'a dyn CommandRunner,
    output: Option<&'a dyn OutputCallback>,
    env: &'a mut RunEnvironment,
    step_env: &'a HashMap<String, String>,
    ctx: StepContext<'a>,
    timeout: Option<Duration>,
    report: StepReport,
}

impl<'a> CommandSession<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        env: &'a mut RunEnvironment,
        step: &'a Step,
        ctx: StepContext<'a>,
    ) -> Self {
        Self {
            runner,
            output: None,
            env,
            step_env: &step.env,
            ctx,
            timeout: step.timeout,
            report: StepReport::default(),
        }
    }

    /// Forward stdout lines to `callback` while commands run
    pub fn with_output(mut self, callback: Option<&'a dyn OutputCallback>) -> Self {
        self.output = callback;
        self
    }

    pub fn env(&self) -> &RunEnvironment {
        &*self.env
    }

    pub fn env_mut(&mut self) -> &mut RunEnvironment {
        &mut *self.env
    }

    pub fn report_mut(&mut self) -> &mut StepReport {
        &mut self.report
    }

    /// Hand back the report collected so far
    pub fn finish(self) -> StepReport {
        self.report
    }

    fn invocation(&self, spec: &CommandSpec) -> Invocation {
        let mut env = self.env.variables.clone();
        env.extend(self.step_env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env.extend(self.ctx.runner_env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env.insert(
            "PATH".to_string(),
            self.env
                .search_path(std::env::var_os("PATH"))
                .to_string_lossy()
                .into_owned(),
        );

        Invocation {
            shell: self.ctx.shell,
            script: spec.script.clone(),
            env,
            working_dir: self.env.working_dir.clone(),
            timeout: self.timeout,
        }
    }

    fn record(&mut self, spec: &CommandSpec, outcome: CommandOutcome, duration: Duration) {
        self.report.commands.push(CommandRecord {
            label: spec.label.clone(),
            outcome,
            duration,
        });
    }

    /// Run one command, honouring its guard and exit policy
    pub async fn exec(&mut self, spec: &CommandSpec) -> Result<Execution, CommandFailure> {
        if let Some(guard) = &spec.guard {
            if !self.env.resolve(guard).exists() {
                let reason = format!("{} not found", guard.display());
                info!("Skipping '{}': {}", spec.label, reason);
                self.record(spec, CommandOutcome::Skipped { reason }, Duration::ZERO);
                return Ok(Execution::Skipped);
            }
        }

        info!("Running: {}", spec.label);
        debug!("Script: {}", spec.script);

        let invocation = self.invocation(spec);
        let started = Instant::now();
        let result = self.runner.run_streaming(&invocation, self.output).await;
        let elapsed = started.elapsed();

        match result {
            Ok(output) => {
                self.report.output.push_str(&output.stdout);

                if output.success() {
                    self.record(spec, CommandOutcome::Succeeded, elapsed);
                    return Ok(Execution::Finished(output));
                }

                let exit_code = output.exit_code;
                match spec.policy {
                    ExitPolicy::Advisory => {
                        warn!("'{}' exited with {:?} (advisory)", spec.label, exit_code);
                        self.record(spec, CommandOutcome::Advisory { exit_code }, elapsed);
                        Ok(Execution::Finished(output))
                    }
                    ExitPolicy::Fatal => {
                        self.record(spec, CommandOutcome::Failed { exit_code }, elapsed);
                        Err(CommandFailure {
                            message: format!(
                                "'{}' exited with {}",
                                spec.label,
                                describe_exit(exit_code)
                            ),
                            output: Some(output),
                        })
                    }
                }
            }
            Err(e) => match spec.policy {
                ExitPolicy::Advisory => {
                    warn!("'{}' could not run (advisory): {}", spec.label, e);
                    self.record(spec, CommandOutcome::Advisory { exit_code: None }, elapsed);
                    Ok(Execution::Finished(CommandOutput {
                        exit_code: None,
                        stdout: String::new(),
                        stderr: e.to_string(),
                    }))
                }
                ExitPolicy::Fatal => {
                    self.record(spec, CommandOutcome::Failed { exit_code: None }, elapsed);
                    Err(CommandFailure {
                        message: format!("'{}' failed: {}", spec.label, e),
                        output: None,
                    })
                }
            },
        }
    }

    /// Run commands in order, stopping at the first fatal failure
    pub async fn run_all(&mut self, specs: &[CommandSpec]) -> Result<(), String> {
        for spec in specs {
            self.exec(spec).await.map_err(|failure| failure.message)?;
        }
        Ok(())
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// Executes a single step
pub struct StepExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> StepExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Execute a step and return the result
    pub async fn execute(
        &self,
        step: &Step,
        env: &mut RunEnvironment,
        ctx: StepContext<'_>,
        callback: Option<&dyn OutputCallback>,
    ) -> ExecutionResult {
        info!("Executing step: {} ({})", step.id, step.action.kind());

        let mut session = CommandSession::new(&self.runner, env, step, ctx).with_output(callback);
        let result = step.action.run(&mut session, ctx.variables).await;
        let report = session.finish();

        match result {
            Ok(()) => {
                info!("Step {} completed successfully", step.id);
                ExecutionResult::Success { report }
            }
            Err(error) => {
                error!("Step {} failed: {}", step.id, error);
                ExecutionResult::Failed { error, report }
            }
        }
    }
}
