//! Command execution facade.
//!
//! [`Executor::run`] starts a program directly from an argument vector; nothing is
//! shell-interpreted. [`Executor::shell`] hands a string to the host shell and is the only
//! way to get pipes, redirection and globbing. Both return an [`ExecutionResult`] for any
//! process that started, whatever its exit status, and an [`ExecError`] only when the process
//! could not be started or its output could not be collected.

mod command;
mod external;
mod quote;
mod stream;

pub use command::{ConsoleSink, ExecutionResult, ExitCode, LineSink, OutputMode, StreamKind};
pub use external::find_command_path;
pub use quote::{join_for_shell, split_command_line};

use crate::env::Environment;
use crate::error::ExecError;
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// Runs commands in a fixed [`Environment`].
///
/// Every call blocks until the child exits. There is no timeout: a child that never exits
/// blocks the caller forever. Children inherit stdin.
///
/// Example
/// ```no_run
/// use sesh::Executor;
/// let sh = Executor::default();
/// let result = sh.run(&["git", "status", "--short"]).unwrap();
/// if !result.success() {
///     eprintln!("{}", result.stderr_text());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Executor {
    env: Environment,
}

impl Executor {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Run `argv` directly and capture its output.
    pub fn run<S: AsRef<OsStr>>(&self, argv: &[S]) -> Result<ExecutionResult, ExecError> {
        self.run_with(argv, OutputMode::Capture)
    }

    /// Run `argv` directly with the given output handling.
    pub fn run_with<S: AsRef<OsStr>>(
        &self,
        argv: &[S],
        mode: OutputMode,
    ) -> Result<ExecutionResult, ExecError> {
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;
        self.execute(program.as_ref(), args, mode, &mut ConsoleSink)
    }

    /// Split `line` into words with shell quoting rules and run it directly.
    ///
    /// Quotes group words, but no pipes, redirection, globbing or variable expansion happen.
    pub fn run_line(&self, line: &str) -> Result<ExecutionResult, ExecError> {
        let argv = split_command_line(line)?;
        self.run(&argv)
    }

    /// Run `argv` directly, feeding each complete output line to `sink`.
    pub fn stream_to<S: AsRef<OsStr>>(
        &self,
        argv: &[S],
        sink: &mut dyn LineSink,
    ) -> Result<ExecutionResult, ExecError> {
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;
        self.execute(program.as_ref(), args, OutputMode::Stream, sink)
    }

    /// Run `command` through the host shell and capture its output.
    ///
    /// The string is passed verbatim to `sh -c` (`cmd /C` on Windows), so anything built
    /// from untrusted input must be quoted with [`join_for_shell`].
    ///
    /// Each call starts a fresh shell. State does not carry over between calls: `cd`, exported
    /// variables and cached `sudo` credentials in one call are gone in the next, so a script
    /// elevating privilege in several calls may be prompted each time.
    pub fn shell(&self, command: &str) -> Result<ExecutionResult, ExecError> {
        self.shell_with(command, OutputMode::Capture)
    }

    /// [`shell`](Self::shell) with the given output handling.
    pub fn shell_with(&self, command: &str, mode: OutputMode) -> Result<ExecutionResult, ExecError> {
        let (shell, flag) = host_shell();
        self.execute(OsStr::new(shell), &[flag, command], mode, &mut ConsoleSink)
    }

    fn execute<S: AsRef<OsStr>>(
        &self,
        program: &OsStr,
        args: &[S],
        mode: OutputMode,
        sink: &mut dyn LineSink,
    ) -> Result<ExecutionResult, ExecError> {
        let name = program.to_string_lossy().into_owned();
        let search_paths = self.env.get_var("PATH").unwrap_or_default();
        let executable =
            find_command_path(OsStr::new(&search_paths), &self.env.current_dir, Path::new(program))
                .ok_or_else(|| ExecError::NotFound(name.clone()))?;

        debug!(
            program = %name,
            args = ?args.iter().map(|a| a.as_ref().to_string_lossy()).collect::<Vec<_>>(),
            ?mode,
            "starting command"
        );

        let (out, err) = match mode {
            OutputMode::Capture | OutputMode::Stream => (Stdio::piped(), Stdio::piped()),
            OutputMode::Inherit => (Stdio::inherit(), Stdio::inherit()),
        };
        let child = Command::new(&*executable)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(out)
            .stderr(err)
            .env_clear()
            .envs(&self.env.vars)
            .envs(&self.env.raw_vars)
            .current_dir(&self.env.current_dir)
            .spawn()
            .map_err(|source| spawn_error(&name, source))?;

        let wait_error = |source: io::Error| ExecError::Wait {
            program: name.clone(),
            source,
        };
        let result = match mode {
            OutputMode::Capture => {
                let output = child.wait_with_output().map_err(wait_error)?;
                ExecutionResult {
                    status: external::exit_code(output.status),
                    stdout: output.stdout,
                    stderr: output.stderr,
                }
            }
            OutputMode::Stream => stream_child(child, sink).map_err(wait_error)?,
            OutputMode::Inherit => {
                let mut child = child;
                let status = child.wait().map_err(wait_error)?;
                ExecutionResult {
                    status: external::exit_code(status),
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                }
            }
        };

        debug!(program = %name, status = result.status, "command finished");
        Ok(result)
    }
}

fn stream_child(mut child: Child, sink: &mut dyn LineSink) -> io::Result<ExecutionResult> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("stderr was not piped"))?;
    let pumped = stream::pump_lines(stdout, stderr, sink);
    // Reap the child even if the sink failed.
    let status = child.wait()?;
    let (stdout, stderr) = pumped?;
    Ok(ExecutionResult {
        status: external::exit_code(status),
        stdout,
        stderr,
    })
}

fn spawn_error(program: &str, source: io::Error) -> ExecError {
    match source.kind() {
        io::ErrorKind::NotFound => ExecError::NotFound(program.to_string()),
        io::ErrorKind::PermissionDenied => ExecError::PermissionDenied(program.to_string()),
        _ => ExecError::Spawn {
            program: program.to_string(),
            source,
        },
    }
}

#[cfg(unix)]
fn host_shell() -> (&'static str, &'static str) {
    ("/bin/sh", "-c")
}

#[cfg(windows)]
fn host_shell() -> (&'static str, &'static str) {
    ("cmd", "/C")
}
