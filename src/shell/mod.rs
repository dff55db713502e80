//! Shell command execution

pub mod subprocess;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use subprocess::SubprocessRunner;

/// Error types for running a command
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Shell that interprets command scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    /// `bash --noprofile --norc -eo pipefail -c`
    #[default]
    Bash,
    /// `sh -e -c`
    Sh,
}

impl Shell {
    pub fn program(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Sh => "sh",
        }
    }

    /// Arguments placed before the script
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Shell::Bash => &["--noprofile", "--norc", "-eo", "pipefail", "-c"],
            Shell::Sh => &["-e", "-c"],
        }
    }
}

/// A fully resolved command to run
#[derive(Debug, Clone)]
pub struct Invocation {
    pub shell: Shell,

    /// Script body
    pub script: String,

    /// Environment overrides, including the computed PATH
    pub env: HashMap<String, String>,

    pub working_dir: PathBuf,

    pub timeout: Option<Duration>,
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code (`None` when killed by a signal)
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout.trim_end(), self.stderr)
        }
    }
}

/// Receives command output while the command is still running
///
/// This trait is object-safe and is passed around as `&dyn OutputCallback`.
pub trait OutputCallback: Send + Sync {
    /// Called for each stdout line, without its line ending
    fn on_line(&self, line: &str);
}

/// Trait for command execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ShellError>;

    /// Run a command, handing stdout lines to `callback` as they arrive
    ///
    /// The default runs to completion and replays stdout afterwards.
    async fn run_streaming(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandOutput, ShellError> {
        let output = self.run(invocation).await?;
        if let Some(callback) = callback {
            for line in output.stdout.lines() {
                callback.on_line(line);
            }
        }
        Ok(output)
    }
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<T> {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ShellError> {
        (**self).run(invocation).await
    }

    async fn run_streaming(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandOutput, ShellError> {
        (**self).run_streaming(invocation, callback).await
    }
}
