//! ci-runner - a sequential, event-filtered CI workflow runner

pub mod actions;
pub mod cli;
pub mod core;
pub mod execution;
pub mod report;
pub mod shell;

// Re-export commonly used types
pub use actions::{CommandSpec, ExitPolicy, StepAction};
pub use core::config::WorkflowConfig;
pub use core::{Event, ExecutionStatus, RunEnvironment, Step, StepState, Workflow, WorkflowRun};
pub use execution::{EngineError, ExecutionEngine, ExecutionEvent};
pub use report::{create_summary, RunSummary};
pub use shell::{
    CommandOutput, CommandRunner, Invocation, OutputCallback, Shell, ShellError, SubprocessRunner,
};
