//! `install-dependencies` - environment update, pinned packages, requirements, project

use crate::actions::{command_line, CommandSpec};
use crate::execution::CommandSession;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallDependencies {
    /// Environment manifest, applied when present
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Environment the manifest is applied to
    #[serde(default = "default_env_name")]
    pub env_name: String,

    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    #[serde(default = "default_installer")]
    pub installer: String,

    /// Extra packages installed unconditionally
    #[serde(default)]
    pub packages: Vec<String>,

    /// Requirements file, installed when present
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,

    /// Install the project in the working directory
    #[serde(default = "default_true")]
    pub install_project: bool,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("environment.yml")
}

fn default_env_name() -> String {
    "base".to_string()
}

fn default_package_manager() -> String {
    "conda".to_string()
}

fn default_installer() -> String {
    "pip".to_string()
}

fn default_requirements() -> PathBuf {
    PathBuf::from("requirements.txt")
}

fn default_true() -> bool {
    true
}

impl InstallDependencies {
    pub fn plan(&self) -> Vec<CommandSpec> {
        let manifest = self.manifest.to_string_lossy();
        let requirements = self.requirements.to_string_lossy();
        let mut commands = Vec::new();

        commands.push(
            CommandSpec::fatal(
                format!("update environment from {}", manifest),
                command_line([
                    self.package_manager.as_str(),
                    "env",
                    "update",
                    "--file",
                    &*manifest,
                    "--name",
                    self.env_name.as_str(),
                ]),
            )
            .guarded_by(&self.manifest),
        );

        if !self.packages.is_empty() {
            let mut words = vec![self.installer.clone(), "install".to_string()];
            words.extend(self.packages.iter().cloned());
            commands.push(CommandSpec::fatal(
                format!("install {}", self.packages.join(" ")),
                command_line(words),
            ));
        }

        commands.push(
            CommandSpec::fatal(
                format!("install {}", requirements),
                command_line([
                    self.installer.as_str(),
                    "install",
                    "-r",
                    &*requirements,
                ]),
            )
            .guarded_by(&self.requirements),
        );

        if self.install_project {
            commands.push(CommandSpec::fatal(
                "install project",
                command_line([self.installer.as_str(), "install", "."]),
            ));
        }

        commands
    }

    pub async fn run(&self, session: &mut CommandSession<'_>) -> Result<(), String> {
        session.run_all(&self.plan()).await
    }
}
