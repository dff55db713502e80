//! `setup-runtime` - select a language runtime and expose it on PATH
//!
//! The runtime root is resolved in this order:
//! 1. `root` from the step's `with:` block
//! 2. The variable named by `root_env` in the run environment
//! 3. The same variable in the runner's own process environment
//!
//! `<root>/<bin_dir>` is appended to the run PATH, then the selection is
//! verified by asking the runtime for its version.

use crate::actions::{command_line, CommandSpec};
use crate::core::RunEnvironment;
use crate::execution::{CommandSession, Execution};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupRuntime {
    /// Requested version, e.g. `3.10`
    pub version: String,

    /// Runtime executable
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Explicit runtime root
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Variable holding the runtime root when `root` is not set
    #[serde(default = "default_root_env")]
    pub root_env: String,

    /// Executable directory under the root
    #[serde(default = "default_bin_dir")]
    pub bin_dir: String,
}

fn default_runtime() -> String {
    "python".to_string()
}

fn default_root_env() -> String {
    "CONDA".to_string()
}

fn default_bin_dir() -> String {
    "bin".to_string()
}

impl SetupRuntime {
    /// Locate the runtime root directory
    pub fn resolve_root(&self, env: &RunEnvironment) -> Result<PathBuf, String> {
        let root = match &self.root {
            Some(root) => env.resolve(root),
            None => env
                .get_variable(&self.root_env)
                .cloned()
                .or_else(|| std::env::var(&self.root_env).ok())
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| {
                    format!(
                        "runtime root not configured: set 'root' or the {} variable",
                        self.root_env
                    )
                })?,
        };

        if !root.is_dir() {
            return Err(format!("runtime root {} does not exist", root.display()));
        }

        Ok(root)
    }

    fn version_check(&self) -> CommandSpec {
        CommandSpec::fatal(
            format!("verify {} {}", self.runtime, self.version),
            command_line([self.runtime.as_str(), "--version"]),
        )
    }

    pub fn plan(&self) -> Vec<CommandSpec> {
        vec![self.version_check()]
    }

    pub async fn run(&self, session: &mut CommandSession<'_>) -> Result<(), String> {
        let root = self.resolve_root(session.env())?;
        let bin = root.join(&self.bin_dir);

        info!("Adding {} to PATH", bin.display());
        session.env_mut().append_path(&bin);
        session
            .report_mut()
            .notes
            .push(format!("added {} to PATH", bin.display()));

        let output = match session.exec(&self.version_check()).await {
            Ok(Execution::Finished(output)) => output,
            Ok(Execution::Skipped) => return Ok(()),
            Err(failure) => return Err(failure.message),
        };

        let reported = output.combined();
        match reported_version(&reported) {
            Some(found) if version_matches(&found, &self.version) => {
                session
                    .report_mut()
                    .notes
                    .push(format!("{} {}", self.runtime, found));
                Ok(())
            }
            Some(found) => Err(format!(
                "requested {} {} but found {}",
                self.runtime, self.version, found
            )),
            None => Err(format!(
                "could not determine {} version from '{}'",
                self.runtime,
                reported.trim()
            )),
        }
    }
}

/// First dotted version number in `output`
fn reported_version(output: &str) -> Option<String> {
    let re = Regex::new(r"\d+(?:\.\d+)+").ok()?;
    re.find(output).map(|m| m.as_str().to_string())
}

/// `3.10.4` satisfies `3.10` and `3.10.4`, but not `3.1`
fn version_matches(found: &str, requested: &str) -> bool {
    found == requested || found.starts_with(&format!("{}.", requested))
}
