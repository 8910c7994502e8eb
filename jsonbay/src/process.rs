//! Process runner - drives the external build/deploy tool chain

use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors from running an external command
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command '{command}' exited with code {code}:\n{output}", code = exit_code.unwrap_or(-1))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },
}

/// How subprocess output is handled, selectable per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Inherit the invoking console (long builds).
    Streamed,
    /// Collect stdout and stderr for later parsing or display.
    Captured,
}

/// Runs external commands in a fixed working directory
pub struct ProcessRunner {
    cwd: PathBuf,
}

impl ProcessRunner {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Run a command line, split on whitespace.
    ///
    /// A non-zero exit always surfaces as `CommandFailed`; a failing
    /// subprocess is never swallowed. Returns the captured text (empty in
    /// streamed mode).
    pub fn run(&self, command: &str, mode: OutputMode) -> Result<String, ProcessError> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some((program, args)) = parts.split_first() else {
            return Err(ProcessError::EmptyCommand);
        };

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.cwd);

        let map_spawn_err = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProcessError::CommandNotFound(program.to_string())
            } else {
                ProcessError::Io(e)
            }
        };

        match mode {
            OutputMode::Captured => {
                let output = cmd
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .map_err(map_spawn_err)?;

                let mut captured = String::from_utf8_lossy(&output.stdout).to_string();
                captured.push_str(&String::from_utf8_lossy(&output.stderr));

                if !output.status.success() {
                    return Err(ProcessError::CommandFailed {
                        command: command.to_string(),
                        exit_code: output.status.code(),
                        output: captured,
                    });
                }
                Ok(captured)
            }
            OutputMode::Streamed => {
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(map_spawn_err)?;

                if !status.success() {
                    return Err(ProcessError::CommandFailed {
                        command: command.to_string(),
                        exit_code: status.code(),
                        output: String::new(),
                    });
                }
                Ok(String::new())
            }
        }
    }
}
