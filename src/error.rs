//! Error types, one enum per failure class.
//!
//! Declaration mistakes ([`SpecError`]) and bad command lines ([`ParseError`]) are fatal when
//! they reach the [`Session`](crate::Session). A command that starts and exits non-zero is not
//! an error at all: only a process that could not be started, or whose output could not be
//! collected, produces an [`ExecError`].

use crate::args::ValueKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A bug in the declaring program, detected while arguments are declared.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("argument name '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("alias '{alias}' is already used by argument '{owner}'")]
    DuplicateAlias { alias: String, owner: String },

    #[error("'{0}' is not a valid argument name")]
    InvalidName(String),

    #[error("'{0}' is not a valid flag or option alias")]
    InvalidAlias(String),

    #[error("no alias given for a flag or option")]
    NoAliases,

    #[error("positional '{declared}' is declared after variable-length positional '{variable}'")]
    PositionalAfterVariable { variable: String, declared: String },

    #[error("option '{0}' cannot take a list as its default")]
    ListDefault(String),

    #[error("arguments can no longer be declared once parsing has happened")]
    AlreadyParsed,
}

/// A command line that does not match the declared arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized argument '{0}'")]
    UnknownSwitch(String),

    #[error("flag '{flag}' does not take a value (got '{token}')")]
    FlagWithValue { flag: String, token: String },

    #[error("option '{option}' expects a value{}", .found.as_ref().map(|t| format!(", found '{t}'")).unwrap_or_default())]
    MissingValue {
        option: String,
        found: Option<String>,
    },

    #[error("option '{option}' expects a value of type {expected}, got '{token}'")]
    Coercion {
        option: String,
        token: String,
        expected: ValueKind,
    },

    #[error("missing value for positional '{name}': expected {expected}, got {found}")]
    MissingPositional {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("unexpected extra arguments: {}", .0.join(" "))]
    UnexpectedPositionals(Vec<String>),

    #[error("argument '{0}' is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("help requested")]
    HelpRequested,

    #[error(transparent)]
    Declaration(#[from] SpecError),
}

/// A command that could not be run to completion.
///
/// Everything except [`ExecError::Wait`] means the process never started.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty command")]
    EmptyCommand,

    #[error("command not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("failed to start '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot split command line '{line}'")]
    Split {
        line: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("failed while waiting for '{program}'")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ExecError {
    /// True when the process was never started.
    pub fn is_failure_to_start(&self) -> bool {
        !matches!(self, ExecError::Wait { .. })
    }
}

/// The script location could not be resolved.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("cannot resolve script path {}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("script path {} has no parent directory", .0.display())]
    NoParent(PathBuf),
}

/// Interactive input failed or was rejected.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input closed")]
    Closed,

    #[error("interrupted")]
    Interrupted,

    #[error("invalid choice '{0}'")]
    InvalidChoice(String),

    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Host information could not be determined.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("unknown system type: {0}")]
    Unsupported(String),

    #[error("missing field '{0}' in host information")]
    MissingField(&'static str),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
