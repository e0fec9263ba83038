//! Locating executables and interpreting how they exited.

use crate::exec::command::ExitCode;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Exit code for a finished process, mapping signal deaths the way a shell does.
pub(crate) fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): resolved against `current_dir`.
/// - `./foo` on Unix or any relative path on other platforms: tried in `current_dir` first.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(
    search_paths: &OsStr,
    current_dir: &Path,
    path: &'a Path,
) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir {
        let local = current_dir.join(path);
        if local.exists() {
            return Some(Cow::Owned(local));
        }
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => {
            let local = current_dir.join(path);
            local.exists().then_some(Cow::Owned(local))
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if is_executable(&path) {
            return Some(path);
        }
        #[cfg(windows)]
        {
            let exe = path.with_extension("exe");
            if exe.exists() {
                return Some(exe);
            }
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

/// PATH search only accepts files with an execute bit; like `sh`, it keeps looking otherwise.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
