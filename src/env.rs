use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Snapshot of the process environment a session works with.
///
/// Commands started by the [`Executor`](crate::Executor) receive `vars` and run in
/// `current_dir`; path expansion reads `HOME` and other variables from here.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// Variables whose name or value is not valid UTF-8. Commands receive them unchanged.
    pub raw_vars: HashMap<OsString, OsString>,
    /// The working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_vars_os(stdenv::vars_os(), current_dir)
    }

    /// An environment with no variables, rooted at `current_dir`.
    pub fn empty(current_dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            raw_vars: HashMap::new(),
            current_dir: current_dir.into(),
        }
    }

    /// Sort OS-level variables into readable and raw entries.
    pub(crate) fn from_vars_os<I>(vars: I, current_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut env = Self::empty(current_dir);
        for (key, val) in vars {
            match (key.into_string(), val.into_string()) {
                (Ok(key), Ok(val)) => {
                    env.vars.insert(key, val);
                }
                (key, val) => {
                    let key = key.map_or_else(|raw| raw, OsString::from);
                    let val = val.map_or_else(|raw| raw, OsString::from);
                    env.raw_vars.insert(key, val);
                }
            }
        }
        env
    }

    /// Get the value of an environment variable from the snapshot.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override a variable for commands started from now on.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        let key = key.into();
        self.raw_vars.remove(OsStr::new(&key));
        self.vars.insert(key, val.into());
    }

    /// Interpret a variable as a boolean switch (`true`, `yes`, `1`, `on`).
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get_var(key).is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "1" | "on"
            )
        })
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
