use std::borrow::Cow;
use std::io::{self, Write};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure. A process killed by
/// a signal reports `128 + signal`, as POSIX shells do.
pub type ExitCode = i32;

/// How a started command's stdout and stderr are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Buffer both streams in memory and return them.
    #[default]
    Capture,
    /// Forward whole lines to the console as they arrive, and keep a copy.
    Stream,
    /// Let the child write straight to this process's stdout and stderr. Nothing is kept.
    Inherit,
}

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Receiver for streamed output.
///
/// Each call carries one complete line including its trailing newline; the last line of a
/// stream may lack one. Calls are made from the thread that started the command, one at a
/// time.
pub trait LineSink {
    fn line(&mut self, stream: StreamKind, line: &[u8]) -> io::Result<()>;
}

/// Writes stdout lines to this process's stdout and stderr lines to its stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LineSink for ConsoleSink {
    fn line(&mut self, stream: StreamKind, line: &[u8]) -> io::Result<()> {
        match stream {
            StreamKind::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(line)?;
                out.flush()
            }
            StreamKind::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(line)?;
                err.flush()
            }
        }
    }
}

/// Outcome of a command that ran to completion, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExitCode,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// `(status, stdout, stderr)` with output decoded as UTF-8 (lossily).
    pub fn into_text(self) -> (ExitCode, String, String) {
        (
            self.status,
            String::from_utf8_lossy(&self.stdout).into_owned(),
            String::from_utf8_lossy(&self.stderr).into_owned(),
        )
    }
}
