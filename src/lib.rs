//! A small toolkit for writing system scripts in Rust.
//!
//! A script builds one [`Session`], declares its command line on it, parses, and then runs
//! programs and shell pipelines through it:
//!
//! ```no_run
//! use sesh::{Arity, Session};
//!
//! fn main() -> std::process::ExitCode {
//!     sesh::main_wrap(|| {
//!         let mut sh = Session::from_current_exe()?;
//!         sh.flag("dry-run").positional("files", Arity::OneOrMore);
//!         let args = sh.parse();
//!
//!         let mut argv = vec!["rsync", "-a"];
//!         if args.flag("dry_run") {
//!             argv.push("--dry-run");
//!         }
//!         argv.extend(args.list("files").iter().map(String::as_str));
//!         argv.push("backup:/srv/");
//!
//!         let result = sh.run(&argv)?;
//!         anyhow::ensure!(result.success(), "rsync failed:\n{}", result.stderr_text());
//!         Ok(())
//!     })
//! }
//! ```
//!
//! The pieces behind the session are usable on their own: [`args`] for argument parsing,
//! [`Executor`] for commands, [`ScriptLocation`] and [`expand_path`] for paths.

pub mod args;
pub mod env;
pub mod error;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod path;
pub mod prompt;
mod session;
pub mod system;

pub use args::{Arity, ParsedArgs, Registry, Value};
pub use env::Environment;
pub use error::{ExecError, LocationError, ParseError, PromptError, SpecError, SystemError};
pub use exec::{ExecutionResult, Executor, ExitCode, OutputMode, join_for_shell};
pub use logging::LogConfig;
pub use path::{ScriptLocation, expand_path};
pub use session::{EXIT_DECLINED, EXIT_SPEC, EXIT_USAGE, Session, main_wrap};
