use std::fmt;

use thiserror::Error;
use tracing::info;

use crate::system::exec::{CommandOutput, run_captured};

/// A configured command, pre-split on single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits on every single space; there is no quoting.
    ///
    /// Returns `None` when there is no program to run.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split(' ');
        let program = parts.next().filter(|p| !p.is_empty())?;
        Some(CommandLine::new(program, parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with status {}: {stdout}\n{stderr}", status_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

fn status_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Stop,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Start => "starting",
            Action::Stop => "stopping",
        }
    }
}

/// Runs the configured start/stop commands.
///
/// Only the exit status decides success. Service managers write progress to
/// stderr, so stderr output is logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    start: CommandLine,
    stop: CommandLine,
}

impl LifecycleController {
    pub fn new(start: CommandLine, stop: CommandLine) -> Self {
        LifecycleController { start, stop }
    }

    pub fn start(&self) -> Result<CommandOutput, LifecycleError> {
        self.run(Action::Start, &self.start)
    }

    pub fn stop(&self) -> Result<CommandOutput, LifecycleError> {
        self.run(Action::Stop, &self.stop)
    }

    fn run(&self, action: Action, command: &CommandLine) -> Result<CommandOutput, LifecycleError> {
        info!(command = %command, "{} database", action.verb());

        let output =
            run_captured(command.program(), command.args()).map_err(|source| {
                LifecycleError::Spawn {
                    command: command.to_string(),
                    source,
                }
            })?;

        if !output.stderr.is_empty() {
            info!(
                stdout = %output.stdout.trim_end(),
                stderr = %output.stderr.trim_end(),
                "message while {} service",
                action.verb()
            );
        }

        if !output.success() {
            return Err(LifecycleError::Failed {
                command: command.to_string(),
                code: output.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}
