use sesh::{EXIT_USAGE, Executor, exec::split_command_line};

const BIN: &str = env!("CARGO_BIN_EXE_sesh-remote");

fn remote(args: &[&str]) -> sesh::ExecutionResult {
    let mut argv = vec![BIN];
    argv.extend_from_slice(args);
    Executor::default().run(&argv).expect("binary starts")
}

#[test]
fn dry_run_prints_quoted_ssh_command() {
    let result = remote(&[
        "--dry-run", "--host", "tower", "--user", "sm", "-p", "2222", "ls", "a b",
    ]);
    assert_eq!(result.status, 0, "{}", result.stderr_text());

    let words = split_command_line(result.stdout_text().trim()).unwrap();
    assert_eq!(words, ["ssh", "-p", "2222", "sm@tower", "ls 'a b'"]);
    assert_eq!(split_command_line(&words[4]).unwrap(), ["ls", "a b"]);
}

#[test]
fn flags_after_double_dash_go_to_the_remote_command() {
    let result = remote(&["--dry-run", "--user", "sm", "--", "ls", "-la"]);
    assert_eq!(result.status, 0, "{}", result.stderr_text());
    let words = split_command_line(result.stdout_text().trim()).unwrap();
    assert_eq!(words, ["ssh", "-p", "22", "sm@localhost", "ls -la"]);
}

#[test]
fn missing_command_is_a_usage_error() {
    let result = remote(&["--dry-run"]);
    assert_eq!(result.status, EXIT_USAGE);
    let stderr = result.stderr_text();
    assert!(stderr.contains("positional 'command'"), "{stderr}");
    assert!(stderr.contains("usage: "), "{stderr}");
    assert!(result.stdout.is_empty());
}

#[test]
fn bad_port_names_the_option_and_token() {
    let result = remote(&["--port", "abc", "ls"]);
    assert_eq!(result.status, EXIT_USAGE);
    let stderr = result.stderr_text();
    assert!(stderr.contains("--port"), "{stderr}");
    assert!(stderr.contains("'abc'"), "{stderr}");
}

#[test]
fn typo_in_flag_is_rejected() {
    let result = remote(&["--dryrun", "ls"]);
    assert_eq!(result.status, EXIT_USAGE);
    assert!(result.stderr_text().contains("'--dryrun'"));
}

#[test]
fn help_prints_usage_and_succeeds() {
    let result = remote(&["--help"]);
    assert_eq!(result.status, 0);
    assert!(result.stdout_text().starts_with("usage: "));
    assert!(result.stdout_text().contains("<command>..."));
}

#[test]
fn failing_script_body_exits_with_one() {
    let empty_path = tempfile::tempdir().unwrap();
    let mut executor = Executor::default();
    executor
        .environment_mut()
        .set_var("PATH", empty_path.path().to_string_lossy());

    let result = executor.run(&[BIN, "--user", "sm", "ls"]).unwrap();
    assert_eq!(result.status, 1);
    assert!(
        result.stderr_text().contains("command not found: ssh"),
        "{}",
        result.stderr_text()
    );
}

#[cfg(unix)]
mod raw_bytes {
    use super::*;
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    #[test]
    fn undecodable_argument_is_a_usage_error() {
        let argv = [
            OsString::from(BIN),
            OsString::from("--dry-run"),
            OsString::from_vec(b"ls\xff".to_vec()),
        ];
        let result = Executor::default().run(&argv).unwrap();
        assert_eq!(result.status, EXIT_USAGE);
        assert!(
            result.stderr_text().contains("not valid UTF-8"),
            "{}",
            result.stderr_text()
        );
    }

    #[test]
    fn undecodable_environment_is_tolerated() {
        let mut executor = Executor::default();
        executor
            .environment_mut()
            .raw_vars
            .insert(OsString::from("SESH_RAW"), OsString::from_vec(vec![0xff, 0xfe]));

        let result = executor
            .run(&[BIN, "--dry-run", "--user", "sm", "ls"])
            .unwrap();
        assert_eq!(result.status, 0, "{}", result.stderr_text());
        assert!(result.stdout_text().starts_with("ssh "));
    }
}
