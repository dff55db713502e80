//! Subprocess runner - executes scripts through a real shell

use crate::shell::{CommandOutput, CommandRunner, Invocation, OutputCallback, ShellError};
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs each invocation as `<shell> <args…> <script>`
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }
}

/// Read both pipes to the end, then reap the child
///
/// stdout is forwarded line by line as it is read.
async fn collect(mut child: Child, callback: Option<&dyn OutputCallback>) -> io::Result<CommandOutput> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let read_stdout = async {
        let mut text = String::new();
        if let Some(stdout) = stdout {
            let mut reader = BufReader::new(stdout);
            let mut line = Vec::new();
            loop {
                line.clear();
                if reader.read_until(b'\n', &mut line).await? == 0 {
                    break;
                }
                let chunk = String::from_utf8_lossy(&line);
                if let Some(callback) = callback {
                    callback.on_line(chunk.trim_end_matches(['\n', '\r']));
                }
                text.push_str(&chunk);
            }
        }
        Ok::<_, io::Error>(text)
    };

    let read_stderr = async {
        let mut bytes = Vec::new();
        if let Some(mut stderr) = stderr {
            stderr.read_to_end(&mut bytes).await?;
        }
        Ok::<_, io::Error>(String::from_utf8_lossy(&bytes).into_owned())
    };

    let (stdout, stderr) = tokio::try_join!(read_stdout, read_stderr)?;
    let status = child.wait().await?;

    Ok(CommandOutput {
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ShellError> {
        self.run_streaming(invocation, None).await
    }

    async fn run_streaming(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandOutput, ShellError> {
        let program = invocation.shell.program();
        debug!(
            "Spawning {} in {} ({} bytes of script)",
            program,
            invocation.working_dir.display(),
            invocation.script.len()
        );

        let mut command = Command::new(program);
        command
            .args(invocation.shell.args())
            .arg(&invocation.script)
            .envs(&invocation.env)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| ShellError::Spawn {
            program: program.to_string(),
            source,
        })?;

        // Dropping the child on timeout kills it
        let result = match invocation.timeout {
            Some(limit) => timeout(limit, collect(child, callback))
                .await
                .map_err(|_| ShellError::Timeout(limit.as_secs()))?,
            None => collect(child, callback).await,
        }
        .map_err(|e| ShellError::Internal(format!("reading output of {}: {}", program, e)))?;

        if !result.success() {
            warn!(
                "{} exited with code {:?}: {}",
                program,
                result.exit_code,
                result.stderr.trim()
            );
        }

        debug!("Command returned {} bytes of output", result.stdout.len());

        Ok(result)
    }
}
