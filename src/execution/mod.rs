//! Workflow execution engine

pub mod engine;
pub mod executor;
pub mod files;

pub use engine::{EngineError, EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::{
    CommandFailure, CommandSession, Execution, ExecutionResult, StepContext, StepExecutor,
};
pub use files::RunFiles;
