//! Small filesystem helpers that create missing parent directories on the way.

use crate::exec::Executor;
use anyhow::{Context, Result, bail};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::NamedTempFile;
use tracing::debug;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([A-Za-z0-9_]+)%").expect("valid placeholder pattern"));

/// Create `path` and all missing parents. Existing directories are fine.
pub fn make_dirs(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).with_context(|| format!("can't create {}", path.display()))
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    ensure_parent(dst)?;
    fs::copy(src, dst)
        .with_context(|| format!("can't copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Move a file or directory, creating the destination's parent directories.
///
/// Falls back to copy-and-delete for files when a rename across filesystems fails.
pub fn move_path(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    ensure_parent(dst)?;
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    if src.is_file() {
        copy_file(src, dst)?;
        fs::remove_file(src).with_context(|| format!("can't remove {}", src.display()))
    } else {
        Err(anyhow::anyhow!(
            "can't move {} to {}",
            src.display(),
            dst.display()
        ))
    }
}

/// Read a text file and replace every `%KEY%` whose key is in `substitutions`.
///
/// Placeholders without a substitution are left untouched.
pub fn render_template(
    path: impl AsRef<Path>,
    substitutions: &HashMap<&str, &str>,
) -> Result<String> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("can't read {}", path.display()))?;
    Ok(substitute(&text, substitutions))
}

/// Create an empty temporary file and return its path. The file is not removed automatically.
///
/// With `dir`, the file is created there, making the directory first if needed.
pub fn temp_file(dir: Option<&Path>) -> Result<PathBuf> {
    let file = match dir {
        Some(dir) => {
            make_dirs(dir)?;
            NamedTempFile::new_in(dir)
        }
        None => NamedTempFile::new(),
    }
    .context("can't create temporary file")?;
    let (_, path) = file.keep().context("can't keep temporary file")?;
    Ok(path)
}

/// Write `data` to a location the script may not own: the bytes go to a temporary file,
/// which a single `sudo mv` then moves into place.
///
/// `sudo` is looked up on the executor's `PATH` and may prompt for a password on the
/// terminal.
pub fn sudo_write(
    executor: &Executor,
    path: impl AsRef<Path>,
    data: impl AsRef<[u8]>,
) -> Result<()> {
    let path = path.as_ref();
    let staged = temp_file(None)?;
    if let Err(err) = fs::write(&staged, data) {
        let _ = fs::remove_file(&staged);
        return Err(err).with_context(|| format!("can't write {}", staged.display()));
    }

    debug!(from = %staged.display(), to = %path.display(), "moving file into place with sudo");
    let argv = [
        OsStr::new("sudo"),
        OsStr::new("mv"),
        staged.as_os_str(),
        path.as_os_str(),
    ];
    let result = match executor.run(&argv) {
        Ok(result) => result,
        Err(err) => {
            let _ = fs::remove_file(&staged);
            return Err(err).context("can't run sudo");
        }
    };
    if !result.success() {
        let _ = fs::remove_file(&staged);
        bail!(
            "sudo mv to {} failed (status {}): {}",
            path.display(),
            result.status,
            result.stderr_text().trim()
        );
    }
    Ok(())
}

fn substitute(text: &str, substitutions: &HashMap<&str, &str>) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures| match substitutions.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => make_dirs(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_known_keys_only() {
        let subs = HashMap::from([("NAME", "atlas"), ("PORT", "22")]);
        assert_eq!(
            substitute("host=%NAME%:%PORT% user=%USER% 100%", &subs),
            "host=atlas:22 user=%USER% 100%"
        );
    }

    #[test]
    fn test_copy_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.txt");
        fs::write(&src, "data").unwrap();
        let dst = tmp.path().join("x/y/z/a.txt");

        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "data");
        assert!(src.exists());
    }

    #[test]
    fn test_move_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.txt");
        fs::write(&src, "data").unwrap();
        let dst = tmp.path().join("moved/a.txt");

        move_path(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "data");
    }

    #[test]
    fn test_move_missing_source_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(move_path(tmp.path().join("nope"), tmp.path().join("dst")).is_err());
    }

    #[test]
    fn test_render_template_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("unit.service");
        fs::write(&path, "ExecStart=%BIN% --port %PORT%\n").unwrap();
        let subs = HashMap::from([("BIN", "/usr/local/bin/tool"), ("PORT", "8080")]);
        assert_eq!(
            render_template(&path, &subs).unwrap(),
            "ExecStart=/usr/local/bin/tool --port 8080\n"
        );
    }

    #[test]
    fn test_temp_file_in_new_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("scratch/area");
        let path = temp_file(Some(&dir)).unwrap();
        assert!(path.is_file());
        assert_eq!(path.parent(), Some(dir.as_path()));

        let elsewhere = temp_file(None).unwrap();
        assert!(elsewhere.is_file());
        fs::remove_file(elsewhere).unwrap();
    }

    #[cfg(unix)]
    fn executor_with_fake_sudo(dir: &Path, body: &str) -> Executor {
        use crate::env::Environment;
        use std::os::unix::fs::PermissionsExt;

        let bin = dir.join("bin");
        make_dirs(&bin).unwrap();
        let sudo = bin.join("sudo");
        fs::write(&sudo, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&sudo, fs::Permissions::from_mode(0o755)).unwrap();

        let mut env = Environment::new();
        env.set_var("PATH", format!("{}:/bin:/usr/bin", bin.display()));
        Executor::new(env)
    }

    #[test]
    #[cfg(unix)]
    fn test_sudo_write_moves_staged_file_into_place() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = executor_with_fake_sudo(tmp.path(), "exec \"$@\"");
        let target = tmp.path().join("hosts");

        sudo_write(&executor, &target, "10.0.0.1 tower\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "10.0.0.1 tower\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_sudo_write_reports_refusal() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = executor_with_fake_sudo(tmp.path(), "echo 'not in sudoers' >&2; exit 1");
        let target = tmp.path().join("hosts");

        let err = sudo_write(&executor, &target, "data").unwrap_err();
        assert!(format!("{err:#}").contains("not in sudoers"), "{err:#}");
        assert!(!target.exists());
    }

    #[test]
    fn test_make_dirs_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b");
        make_dirs(&dir).unwrap();
        make_dirs(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
