//! `run:` steps - an arbitrary shell script

use crate::actions::CommandSpec;
use crate::core::step::render_template;
use crate::execution::CommandSession;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Script template, may contain `{{ name }}` placeholders
    pub template: String,
}

impl Script {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// First non-empty line, used as the command label
    pub fn label(&self) -> String {
        self.template
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("run")
            .to_string()
    }

    pub fn plan(&self, variables: &HashMap<String, String>) -> Vec<CommandSpec> {
        vec![CommandSpec::fatal(
            self.label(),
            render_template(&self.template, variables),
        )]
    }

    pub async fn run(
        &self,
        session: &mut CommandSession<'_>,
        variables: &HashMap<String, String>,
    ) -> Result<(), String> {
        session.run_all(&self.plan(variables)).await
    }
}
