//! `test` - run the project's test suite

use crate::actions::{command_line, CommandSpec};
use crate::core::TestSummary;
use crate::execution::{CommandSession, Execution};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSuite {
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

fn default_command() -> String {
    "pytest".to_string()
}

impl TestSuite {
    fn command(&self) -> CommandSpec {
        let mut words = vec![self.command.clone()];
        words.extend(self.args.iter().cloned());
        CommandSpec::fatal(format!("run {}", self.command), command_line(words))
    }

    pub fn plan(&self) -> Vec<CommandSpec> {
        vec![self.command()]
    }

    pub async fn run(&self, session: &mut CommandSession<'_>) -> Result<(), String> {
        match session.exec(&self.command()).await {
            Ok(Execution::Finished(output)) => {
                session.report_mut().tests = parse_summary(&output.stdout);
                Ok(())
            }
            Ok(Execution::Skipped) => Ok(()),
            Err(failure) => {
                let summary = failure.output.as_ref().and_then(|o| parse_summary(&o.stdout));
                session.report_mut().tests = summary;

                match summary {
                    Some(s) if s.failed + s.errors > 0 => Err(format!(
                        "{} test(s) failed, {} error(s)",
                        s.failed, s.errors
                    )),
                    _ => Err(failure.message),
                }
            }
        }
    }
}

/// Parse the closing `N passed, M failed in 1.2s` line of a pytest session
pub fn parse_summary(output: &str) -> Option<TestSummary> {
    let re = Regex::new(r"(\d+) (passed|failed|skipped|errors?)\b").ok()?;

    for line in output.lines().rev() {
        let mut summary = TestSummary::default();
        let mut matched = false;

        for caps in re.captures_iter(line) {
            let count: usize = caps[1].parse().ok()?;
            match &caps[2] {
                "passed" => summary.passed = count,
                "failed" => summary.failed = count,
                "skipped" => summary.skipped = count,
                _ => summary.errors = count,
            }
            matched = true;
        }

        if matched {
            return Some(summary);
        }
    }

    None
}
