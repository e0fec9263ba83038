use anyhow::ensure;
use sesh::{Arity, LogConfig, Session};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

/// Run a command on a remote host over ssh.
///
/// `sesh-remote --host tower -p 2222 -- ls -la /srv`
fn main() -> ExitCode {
    sesh::main_wrap(remote)
}

fn remote() -> anyhow::Result<()> {
    let mut sh = Session::from_current_exe()?;
    sh.flag(["-v", "--verbose"])
        .flag("dry-run")
        .option("host", "localhost")
        .option("user", "")
        .option(["-p", "--port"], 22)
        .positional("command", Arity::OneOrMore);
    // The log level depends on `--verbose`, so logging starts after parsing. Parse failures
    // are reported on stderr by the session itself.
    let args = sh.parse();

    let level = if args.flag("verbose") {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    sh.init_logging(&LogConfig {
        console_level: level,
        ..LogConfig::default()
    })?;

    let user = match args.str("user") {
        Some(user) if !user.is_empty() => user.to_string(),
        _ => sh.user_name().unwrap_or_else(|| "root".to_string()),
    };
    let host = args.str("host").unwrap_or("localhost");
    let port = args.int("port").unwrap_or(22);
    let remote_command = sh.join_for_shell(args.list("command"));

    let argv = [
        "ssh".to_string(),
        "-p".to_string(),
        port.to_string(),
        format!("{user}@{host}"),
        remote_command,
    ];

    if args.flag("dry_run") {
        println!("{}", sh.join_for_shell(&argv));
        return Ok(());
    }

    let result = sh.run(&argv)?;
    ensure!(
        result.success(),
        "could not run remote command (status {}):\n{}",
        result.status,
        result.stderr_text()
    );
    print!("{}", result.stdout_text());
    Ok(())
}
