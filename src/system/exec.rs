use std::io;
use std::process::{Command, ExitStatus, Stdio};

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Runs `program` with `args` to completion and captures both streams.
///
/// Blocks for the lifetime of the child. Callers on the async runtime must
/// go through `spawn_blocking`.
pub fn run_captured<S: AsRef<str>>(program: &str, args: &[S]) -> io::Result<CommandOutput> {
    let output = Command::new(program)
        .args(args.iter().map(|arg| AsRef::<str>::as_ref(arg)))
        .stdin(Stdio::null())
        .output()?;

    Ok(CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Runs a shell pipeline through `bash -c`.
pub fn run_shell(pipeline: &str) -> io::Result<CommandOutput> {
    run_captured("bash", &["-c", pipeline])
}
