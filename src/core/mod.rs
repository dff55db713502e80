//! Core domain models for the runner
//!
//! This module defines the fundamental data structures that represent
//! workflows, triggers, steps, and the state of a run.

pub mod condition;
pub mod config;
pub mod context;
pub mod state;
pub mod step;
pub mod trigger;
pub mod workflow;

pub use condition::RunCondition;
pub use context::RunEnvironment;
pub use state::*;
pub use step::Step;
pub use trigger::{Event, EventKind, Triggers};
pub use workflow::{Workflow, WorkflowRun};
