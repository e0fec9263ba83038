//! Path resolution relative to the running script, and user-environment expansion.
//!
//! The two are kept apart on purpose: [`ScriptLocation::local_path`] answers "next to where
//! this script is installed", [`expand_path`] answers "where the invoking user points".

use crate::env::Environment;
use crate::error::LocationError;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("valid variable pattern")
});

/// Canonical location of a script, symlinks resolved.
///
/// A script installed as a symlink in `~/.local/bin` resolves to the directory holding the
/// real file, so resources shipped next to it are found regardless of how it was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLocation {
    dir: PathBuf,
    file: PathBuf,
}

impl ScriptLocation {
    /// Resolve `script` through the filesystem. The file must exist.
    pub fn new(script: impl AsRef<Path>) -> Result<Self, LocationError> {
        let script = script.as_ref();
        let canonical = fs::canonicalize(script).map_err(|source| LocationError::Resolve {
            path: script.to_path_buf(),
            source,
        })?;
        Self::from_canonical(canonical)
    }

    /// Location of the running executable.
    pub fn current_exe() -> Result<Self, LocationError> {
        let exe = std::env::current_exe().map_err(|source| LocationError::Resolve {
            path: PathBuf::from("<current executable>"),
            source,
        })?;
        Self::new(exe)
    }

    /// Build a location from a path already known to be absolute and resolved.
    pub fn from_canonical(path: impl Into<PathBuf>) -> Result<Self, LocationError> {
        let path = path.into();
        match (path.parent(), path.file_name()) {
            (Some(dir), Some(file)) => Ok(Self {
                dir: dir.to_path_buf(),
                file: PathBuf::from(file),
            }),
            _ => Err(LocationError::NoParent(path)),
        }
    }

    /// Directory holding the script.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &Path {
        &self.file
    }

    pub fn script_path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }

    /// `relative` joined onto the script directory. Absolute arguments come back unchanged.
    pub fn local_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.join(relative)
    }
}

/// Expand a leading `~` and `$NAME` / `${NAME}` references.
///
/// `HOME` comes from `env` first and the platform home directory second. Variables missing
/// from `env` are left as written, and `~user` forms are not expanded.
pub fn expand_path(path: &str, env: &Environment) -> PathBuf {
    let expanded = VAR_RE.replace_all(path, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        env.get_var(name).unwrap_or_else(|| caps[0].to_string())
    });

    let home = || {
        env.get_var("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    };
    if expanded == "~" {
        if let Some(home) = home() {
            return home;
        }
    } else if let Some(rest) = expanded.strip_prefix("~/") {
        if let Some(home) = home() {
            return home.join(rest);
        }
    }
    PathBuf::from(expanded.into_owned())
}
