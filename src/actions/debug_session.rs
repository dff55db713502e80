//! `debug-session` - open a remote terminal session after a failure

use crate::actions::{command_line, CommandSpec};
use crate::execution::{CommandSession, Execution};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebugSession {
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

impl Default for DebugSession {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
        }
    }
}

fn default_command() -> String {
    "tmate".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-F".to_string()]
}

impl DebugSession {
    fn command(&self) -> CommandSpec {
        let mut words = vec![self.command.clone()];
        words.extend(self.args.iter().cloned());
        CommandSpec::advisory(format!("open {} session", self.command), command_line(words))
    }

    pub fn plan(&self) -> Vec<CommandSpec> {
        vec![self.command()]
    }

    /// The session's own exit status never changes the outcome of the run
    pub async fn run(&self, session: &mut CommandSession<'_>) -> Result<(), String> {
        info!("Opening debug session with {}", self.command);

        if let Ok(Execution::Finished(output)) = session.exec(&self.command()).await {
            if output.success() {
                info!("Debug session closed");
            } else {
                warn!(
                    "Debug session ended with code {:?}: {}",
                    output.exit_code,
                    output.stderr.trim()
                );
            }
        }

        Ok(())
    }
}
