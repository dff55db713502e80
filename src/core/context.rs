//! Run environment - variables and PATH shared by every step of a run

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment of a workflow run
///
/// Written by the runtime provisioner (and by scripts through the path/env
/// files), read by every later step. PATH entries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEnvironment {
    /// Environment variables exported to every command
    pub variables: HashMap<String, String>,

    /// Directories added to the search path, in the order they were added
    path_entries: Vec<PathBuf>,

    /// Directory commands run in
    pub working_dir: PathBuf,

    /// Outputs of completed steps (step_id -> stdout)
    pub step_outputs: HashMap<String, String>,
}

impl RunEnvironment {
    /// Create an empty environment rooted at `working_dir`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            variables: HashMap::new(),
            path_entries: Vec::new(),
            working_dir: working_dir.into(),
            step_outputs: HashMap::new(),
        }
    }

    /// Set a variable
    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Get a variable
    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    /// Append directories to the search path, ignoring duplicates
    ///
    /// A value holding several separator-joined directories adds each of them.
    pub fn append_path(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        for entry in std::env::split_paths(dir.as_os_str()) {
            if !entry.as_os_str().is_empty() && !self.path_entries.contains(&entry) {
                self.path_entries.push(entry);
            }
        }
    }

    /// Directories appended so far
    pub fn path_entries(&self) -> &[PathBuf] {
        &self.path_entries
    }

    /// Set the output of a step
    pub fn set_step_output(&mut self, step_id: &str, output: String) {
        self.step_outputs.insert(step_id.to_string(), output);
    }

    /// Resolve a path relative to the working directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Compute the PATH value commands should see
    ///
    /// Appended directories take precedence over `base`, the newest first.
    /// Entries that cannot be placed on a PATH are dropped, never `base`.
    pub fn search_path(&self, base: Option<OsString>) -> OsString {
        let base = base.unwrap_or_default();
        let mut dirs = Vec::new();
        for dir in self.path_entries.iter().rev() {
            if std::env::join_paths([dir]).is_ok() {
                dirs.push(dir.clone());
            } else {
                warn!("Ignoring PATH entry {}", dir.display());
            }
        }
        dirs.extend(std::env::split_paths(&base));

        match std::env::join_paths(dirs) {
            Ok(path) => path,
            Err(e) => {
                warn!("Could not extend PATH: {}", e);
                base
            }
        }
    }

    /// Variables available for `{{ name }}` substitution in scripts
    ///
    /// Exported variables and step outputs come first; `variables` (workflow
    /// variables, then command line overrides) replace them.
    pub fn rendering_variables(&self, variables: &HashMap<String, String>) -> HashMap<String, String> {
        let mut vars = self.variables.clone();

        for (step_id, output) in &self.step_outputs {
            vars.insert(format!("steps.{}.output", step_id), output.trim().to_string());
        }

        vars.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }
}
