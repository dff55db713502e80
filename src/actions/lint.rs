//! `lint` - static checker in fail-fast or advisory mode

use crate::actions::{command_line, CommandSpec};
use crate::execution::{CommandSession, Execution};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How lint findings are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LintMode {
    /// Restricted to severe diagnostics; any finding fails the run
    FailFast,
    /// Broad diagnostics; findings are reported, never fatal
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lint {
    pub mode: LintMode,

    #[serde(default = "default_tool")]
    pub tool: String,

    /// Source tree to check
    #[serde(default = "default_target")]
    pub target: String,

    /// Diagnostic codes checked in fail-fast mode
    #[serde(default = "default_select")]
    pub select: Vec<String>,

    /// Codes ignored in advisory mode
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default = "default_max_complexity")]
    pub max_complexity: u32,

    #[serde(default = "default_max_line_length")]
    pub max_line_length: u32,
}

fn default_tool() -> String {
    "flake8".to_string()
}

fn default_target() -> String {
    ".".to_string()
}

/// Syntax errors and undefined names
fn default_select() -> Vec<String> {
    ["E9", "F63", "F7", "F82"].iter().map(|s| s.to_string()).collect()
}

fn default_max_complexity() -> u32 {
    10
}

fn default_max_line_length() -> u32 {
    127
}

impl Lint {
    fn command(&self) -> CommandSpec {
        let mut words = vec![self.tool.clone(), self.target.clone(), "--count".to_string()];

        match self.mode {
            LintMode::FailFast => {
                words.push(format!("--select={}", self.select.join(",")));
                words.push("--show-source".to_string());
                words.push("--statistics".to_string());
                CommandSpec::fatal(
                    format!("{} severe diagnostics", self.tool),
                    command_line(words),
                )
            }
            LintMode::Advisory => {
                words.push("--exit-zero".to_string());
                words.push(format!("--max-complexity={}", self.max_complexity));
                words.push(format!("--max-line-length={}", self.max_line_length));
                if !self.ignore.is_empty() {
                    words.push(format!("--extend-ignore={}", self.ignore.join(",")));
                }
                words.push("--statistics".to_string());
                CommandSpec::advisory(format!("{} style report", self.tool), command_line(words))
            }
        }
    }

    pub fn plan(&self) -> Vec<CommandSpec> {
        vec![self.command()]
    }

    pub async fn run(&self, session: &mut CommandSession<'_>) -> Result<(), String> {
        match session.exec(&self.command()).await {
            Ok(Execution::Finished(output)) => {
                let findings = count_findings(&output.stdout);
                session.report_mut().findings = findings;

                if self.mode == LintMode::Advisory {
                    let count = findings.unwrap_or(0);
                    if count > 0 {
                        info!("{} advisory finding(s), not gating", count);
                        session
                            .report_mut()
                            .notes
                            .push(format!("{} advisory finding(s)", count));
                    }
                }
                Ok(())
            }
            Ok(Execution::Skipped) => Ok(()),
            Err(failure) => {
                let findings = failure
                    .output
                    .as_ref()
                    .and_then(|o| count_findings(&o.stdout));
                session.report_mut().findings = findings;

                match findings {
                    Some(count) if count > 0 => {
                        warn!("{} severe diagnostic(s) found", count);
                        Err(format!("{} severe diagnostic(s) found", count))
                    }
                    _ => Err(failure.message),
                }
            }
        }
    }
}

/// `--count` prints the total number of findings on the last line
pub fn count_findings(stdout: &str) -> Option<usize> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse().ok())
}
