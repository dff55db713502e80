//! Run-scoped path/env files
//!
//! Commands receive `RUNNER_PATH` and `RUNNER_ENV`. After each step, lines
//! written to the path file are appended to the run PATH and `KEY=VALUE`
//! lines written to the env file are set in the run environment.

use crate::core::RunEnvironment;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::debug;

pub const PATH_FILE_VAR: &str = "RUNNER_PATH";
pub const ENV_FILE_VAR: &str = "RUNNER_ENV";

pub struct RunFiles {
    _dir: TempDir,
    path_file: PathBuf,
    env_file: PathBuf,
}

impl RunFiles {
    /// Create both files in a fresh temporary directory
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("ci-runner-").tempdir()?;
        let path_file = dir.path().join("path");
        let env_file = dir.path().join("env");

        let files = Self {
            _dir: dir,
            path_file,
            env_file,
        };
        files.reset()?;
        Ok(files)
    }

    /// Truncate both files before a step
    pub fn reset(&self) -> io::Result<()> {
        fs::write(&self.path_file, "")?;
        fs::write(&self.env_file, "")
    }

    /// Variables pointing commands at the files
    pub fn env_vars(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                PATH_FILE_VAR.to_string(),
                self.path_file.to_string_lossy().into_owned(),
            ),
            (
                ENV_FILE_VAR.to_string(),
                self.env_file.to_string_lossy().into_owned(),
            ),
        ])
    }

    /// Apply what the last step wrote; returns a note per change
    pub fn apply(&self, env: &mut RunEnvironment) -> io::Result<Vec<String>> {
        let mut notes = Vec::new();

        for line in fs::read_to_string(&self.path_file)?.lines() {
            let dir = line.trim();
            if dir.is_empty() {
                continue;
            }
            debug!("Path file added {}", dir);
            env.append_path(dir);
            notes.push(format!("added {} to PATH", dir));
        }

        for line in fs::read_to_string(&self.env_file)?.lines() {
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                debug!("Env file set {}", key);
                env.set_variable(key, value);
                notes.push(format!("set {}", key));
            }
        }

        Ok(notes)
    }
}
