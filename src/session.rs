use crate::args::{Arity, IntoAliases, ParsedArgs, Registry, Value, decode_tokens};
use crate::env::Environment;
use crate::error::{ExecError, LocationError, ParseError, PromptError, SpecError, SystemError};
use crate::exec::{ExecutionResult, Executor, OutputMode, join_for_shell};
use crate::fs;
use crate::logging::{self, LogConfig};
use crate::path::{ScriptLocation, expand_path};
use crate::prompt::Prompter;
use crate::system::{self, OsInfo};
use std::ffi::OsStr;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process;
use tracing::warn;

/// Exit status when a confirmation is declined.
pub const EXIT_DECLINED: i32 = 1;
/// Exit status for a command line that does not match the declarations.
pub const EXIT_USAGE: i32 = 2;
/// Exit status for an invalid declaration, which is a bug in the script itself.
pub const EXIT_SPEC: i32 = 70;

/// Environment variable that switches [`main_wrap`] to full error reports.
pub const ERRORS_ENV: &str = "SESH_ERRORS";

/// Everything a script needs behind one value: argument declarations, command execution,
/// paths relative to the script, prompts and host information.
///
/// Declaration and parse problems end the process with a message, the way command-line tools
/// usually behave, so scripts never see a half-validated command line. Commands that fail are
/// returned as data for the script to inspect.
///
/// Example
/// ```no_run
/// use sesh::{Arity, Session};
///
/// let mut sh = Session::from_current_exe().unwrap();
/// sh.flag(["-v", "--verbose"])
///     .option("port", 22)
///     .positional("host", Arity::Exactly(1));
/// let args = sh.parse();
///
/// let config = sh.local_path("hosts.conf");
/// let result = sh.run(&["ping", "-c", "1", args.str("host").unwrap()]).unwrap();
/// if !result.success() {
///     eprintln!("{} is down ({})", args.str("host").unwrap(), config.display());
/// }
/// ```
pub struct Session {
    location: ScriptLocation,
    program: String,
    registry: Option<Registry>,
    executor: Executor,
    prompter: Prompter,
}

impl Session {
    /// Session for the script at `script`, which must exist.
    pub fn new(script: impl AsRef<Path>) -> Result<Self, LocationError> {
        let script = script.as_ref();
        let location = ScriptLocation::new(script)?;
        let program = script
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.file_name().to_string_lossy().into_owned());
        Ok(Self::with_parts(
            location,
            program,
            Executor::default(),
            Prompter::terminal(),
        ))
    }

    /// Session for the running executable.
    pub fn from_current_exe() -> Result<Self, LocationError> {
        let location = ScriptLocation::current_exe()?;
        let program = std::env::args()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| location.file_name().to_string_lossy().into_owned());
        Ok(Self::with_parts(
            location,
            program,
            Executor::default(),
            Prompter::terminal(),
        ))
    }

    /// Assemble a session from explicit components.
    pub fn with_parts(
        location: ScriptLocation,
        program: impl Into<String>,
        executor: Executor,
        prompter: Prompter,
    ) -> Self {
        Self {
            location,
            program: program.into(),
            registry: Some(Registry::new()),
            executor,
            prompter,
        }
    }

    /// Install console logging, plus a log file when configured.
    pub fn init_logging(&self, config: &LogConfig) -> anyhow::Result<()> {
        logging::init(config)
    }

    // Argument declarations

    /// The registry, until arguments have been parsed.
    pub fn registry_mut(&mut self) -> Result<&mut Registry, SpecError> {
        self.registry.as_mut().ok_or(SpecError::AlreadyParsed)
    }

    pub fn positional(&mut self, name: &str, arity: Arity) -> &mut Self {
        let res = self
            .registry_mut()
            .and_then(|reg| reg.positional(name, arity).map(drop));
        self.declared(res)
    }

    pub fn flag(&mut self, aliases: impl IntoAliases) -> &mut Self {
        let res = self
            .registry_mut()
            .and_then(|reg| reg.flag(aliases).map(drop));
        self.declared(res)
    }

    pub fn option(&mut self, aliases: impl IntoAliases, default: impl Into<Value>) -> &mut Self {
        let res = self
            .registry_mut()
            .and_then(|reg| reg.option(aliases, default).map(drop));
        self.declared(res)
    }

    fn declared(&mut self, res: Result<(), SpecError>) -> &mut Self {
        if let Err(err) = res {
            warn!(error = %err, "invalid argument declaration");
            eprintln!("{}: specification error: {err}", self.program);
            process::exit(EXIT_SPEC);
        }
        self
    }

    /// Usage line for the arguments declared so far.
    pub fn usage(&self) -> String {
        self.registry
            .as_ref()
            .map(|reg| reg.usage(&self.program))
            .unwrap_or_default()
    }

    // Parsing

    /// Parse the process arguments, exiting on any mismatch.
    pub fn parse(&mut self) -> ParsedArgs {
        match decode_tokens(std::env::args_os().skip(1)) {
            Ok(tokens) => self.parse_from(tokens),
            Err(err) => {
                let usage = self.usage();
                self.exit_on(err, &usage)
            }
        }
    }

    /// Parse `tokens`, exiting on any mismatch.
    ///
    /// `--help` (unless declared by the script) prints usage and exits 0. Anything else that
    /// does not match prints the problem and the usage line to stderr and exits with
    /// [`EXIT_USAGE`]. Parsing a second time exits with [`EXIT_SPEC`].
    pub fn parse_from<I, S>(&mut self, tokens: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let usage = self.usage();
        match self.try_parse_from(tokens) {
            Ok(args) => args,
            Err(err) => self.exit_on(err, &usage),
        }
    }

    /// Parse `tokens` and hand back any error instead of exiting.
    ///
    /// The declarations are consumed either way; a second parse is
    /// [`SpecError::AlreadyParsed`].
    pub fn try_parse_from<I, S>(&mut self, tokens: I) -> Result<ParsedArgs, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = self.registry.take().ok_or(SpecError::AlreadyParsed)?;
        registry.into_parser().parse(tokens)
    }

    fn exit_on(&self, err: ParseError, usage: &str) -> ! {
        match err {
            ParseError::HelpRequested => {
                println!("{usage}");
                process::exit(0);
            }
            ParseError::Declaration(err) => {
                warn!(error = %err, "invalid argument declaration");
                eprintln!("{}: specification error: {err}", self.program);
                process::exit(EXIT_SPEC);
            }
            err => {
                warn!(error = %err, "invalid command line");
                eprintln!("{}: error: {err}\n{usage}", self.program);
                process::exit(EXIT_USAGE);
            }
        }
    }

    // Paths

    pub fn location(&self) -> &ScriptLocation {
        &self.location
    }

    /// `relative` resolved against the directory holding the script.
    pub fn local_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.location.local_path(relative)
    }

    /// Expand `~` and environment variables in `path`.
    pub fn expand_path(&self, path: &str) -> PathBuf {
        expand_path(path, self.executor.environment())
    }

    // Commands

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        self.executor.environment_mut()
    }

    /// See [`Executor::run`].
    pub fn run<S: AsRef<OsStr>>(&self, argv: &[S]) -> Result<ExecutionResult, ExecError> {
        self.executor.run(argv)
    }

    /// See [`Executor::run_with`].
    pub fn run_with<S: AsRef<OsStr>>(
        &self,
        argv: &[S],
        mode: OutputMode,
    ) -> Result<ExecutionResult, ExecError> {
        self.executor.run_with(argv, mode)
    }

    /// See [`Executor::run_line`].
    pub fn run_line(&self, line: &str) -> Result<ExecutionResult, ExecError> {
        self.executor.run_line(line)
    }

    /// See [`Executor::shell`], including the note on per-call subshells.
    pub fn shell(&self, command: &str) -> Result<ExecutionResult, ExecError> {
        self.executor.shell(command)
    }

    /// See [`Executor::shell_with`].
    pub fn shell_with(&self, command: &str, mode: OutputMode) -> Result<ExecutionResult, ExecError> {
        self.executor.shell_with(command, mode)
    }

    /// See [`join_for_shell`].
    pub fn join_for_shell<I, S>(&self, words: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        join_for_shell(words)
    }

    // Environment, user and host

    /// Value of an environment variable in the session's environment.
    pub fn env(&self, name: &str) -> Option<String> {
        self.executor.environment().get_var(name)
    }

    pub fn env_or(&self, name: &str, default: &str) -> String {
        self.env(name).unwrap_or_else(|| default.to_string())
    }

    pub fn user_name(&self) -> Option<String> {
        system::user_name(self.executor.environment())
    }

    pub fn uid(&self) -> Option<u32> {
        system::uid(self.executor.environment())
    }

    pub fn os_info(&self) -> Result<OsInfo, SystemError> {
        system::os_info()
    }

    // Files

    /// See [`fs::temp_file`].
    pub fn temp_file(&self, dir: Option<&Path>) -> anyhow::Result<PathBuf> {
        fs::temp_file(dir)
    }

    /// See [`fs::sudo_write`]. Every call asks `sudo` afresh, like [`Session::shell`].
    pub fn sudo_write(
        &self,
        path: impl AsRef<Path>,
        data: impl AsRef<[u8]>,
    ) -> anyhow::Result<()> {
        fs::sudo_write(&self.executor, path, data)
    }

    // Prompts

    pub fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.prompter.ask(prompt)
    }

    pub fn confirm(&mut self, prompt: &str) -> Result<bool, PromptError> {
        self.prompter.confirm(prompt)
    }

    /// Ask for confirmation and exit with [`EXIT_DECLINED`] unless the answer is yes.
    pub fn confirm_or_exit(&mut self, prompt: &str) {
        match self.prompter.confirm(prompt) {
            Ok(true) => {}
            Ok(false) => process::exit(EXIT_DECLINED),
            Err(err) => {
                eprintln!("{}: {err}", self.program);
                process::exit(EXIT_DECLINED);
            }
        }
    }

    pub fn choose<'a, T: Display>(
        &mut self,
        prompt: &str,
        options: &'a [T],
    ) -> Result<&'a T, PromptError> {
        self.prompter.choose(prompt, options)
    }
}

/// Run a script body and turn its error into exit status 1.
///
/// The error and its causes are printed on one line. With `SESH_ERRORS=true` the full
/// report is printed instead, including a backtrace when `RUST_BACKTRACE` is set.
pub fn main_wrap<F>(body: F) -> process::ExitCode
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match body() {
        Ok(()) => process::ExitCode::SUCCESS,
        Err(err) => {
            let verbose = Environment::new().is_enabled(ERRORS_ENV);
            eprintln!("{}", error_report(&err, verbose));
            process::ExitCode::FAILURE
        }
    }
}

fn error_report(err: &anyhow::Error, verbose: bool) -> String {
    if verbose {
        format!("{err:?}")
    } else {
        format!("{err:#}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedInput;
    use std::io;

    fn session(answers: &[&str]) -> Session {
        let location = ScriptLocation::from_canonical("/opt/tools/deploy").unwrap();
        let prompter = Prompter::new(
            Box::new(ScriptedInput::new(answers.iter().copied())),
            Box::new(io::sink()),
        );
        let mut env = Environment::new();
        env.set_var("HOME", "/home/sm");
        Session::with_parts(location, "deploy", Executor::new(env), prompter)
    }

    #[test]
    fn test_declare_and_parse() {
        let mut sh = session(&[]);
        sh.flag("venv")
            .option("venv_name", ".venv")
            .option("requirements", "")
            .positional("target", Arity::Exactly(1));
        assert_eq!(
            sh.usage(),
            "usage: deploy [--venv] [--venv-name <value>] [--requirements <value>] <target>"
        );

        let args = sh
            .try_parse_from(["--venv", "--venv-name", "env", "app/main.py"])
            .unwrap();
        assert!(args.flag("venv"));
        assert_eq!(args.str("venv_name"), Some("env"));
        assert_eq!(args.str("requirements"), Some(""));
        assert_eq!(args.str("target"), Some("app/main.py"));
    }

    #[test]
    fn test_declarations_close_after_parse() {
        let mut sh = session(&[]);
        sh.flag("verbose");
        sh.try_parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(sh.registry_mut().unwrap_err(), SpecError::AlreadyParsed);
        assert_eq!(sh.usage(), "");
        assert_eq!(
            sh.try_parse_from(["--verbose"]).unwrap_err(),
            ParseError::Declaration(SpecError::AlreadyParsed)
        );
    }

    #[test]
    fn test_parse_errors_are_returned_by_try_parse() {
        let mut sh = session(&[]);
        sh.option("port", 22);
        let err = sh.try_parse_from(["--port", "abc"]).unwrap_err();
        assert!(matches!(err, ParseError::Coercion { .. }));
    }

    #[test]
    fn test_paths() {
        let sh = session(&[]);
        assert_eq!(
            sh.local_path("files/base.py"),
            PathBuf::from("/opt/tools/files/base.py")
        );
        assert_eq!(sh.expand_path("~/bin"), PathBuf::from("/home/sm/bin"));
        assert_eq!(sh.env_or("HOME", "/"), "/home/sm");
        assert_eq!(sh.env_or("SESH_UNSET_VAR", "fallback"), "fallback");
    }

    #[test]
    fn test_prompts_go_through_the_prompter() {
        let mut sh = session(&["x", "y", "3"]);
        assert!(sh.confirm("proceed? ").unwrap());
        let options = ["a", "b", "c"];
        assert_eq!(*sh.choose("which? ", &options).unwrap(), "c");
    }

    #[test]
    #[cfg(unix)]
    fn test_run_through_session() {
        let sh = session(&[]);
        let words = ["a b", "c\"d"];
        let result = sh
            .shell(&format!("printf '%s\\n' {}", sh.join_for_shell(words)))
            .unwrap();
        assert_eq!(result.stdout_text(), "a b\nc\"d\n");
        assert_eq!(sh.run(&["false"]).unwrap().status, 1);
    }

    #[test]
    fn test_error_report_forms() {
        let err = anyhow::anyhow!("connection refused").context("could not reach tower");
        assert_eq!(
            error_report(&err, false),
            "could not reach tower: connection refused"
        );
        assert!(error_report(&err, true).contains("Caused by"));
    }
}
