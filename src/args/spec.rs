use crate::args::value::{Value, ValueKind};
use crate::error::SpecError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid name pattern"));

/// How many command-line values a positional argument binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` values.
    Exactly(usize),
    /// Zero or one value.
    Optional,
    /// At least one value; claims everything left.
    OneOrMore,
    /// Any number of values; claims everything left.
    ZeroOrMore,
}

impl Arity {
    /// Variable arities must close the positional list.
    pub fn is_variable(self) -> bool {
        !matches!(self, Arity::Exactly(_))
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(1) => f.write_str("1 value"),
            Arity::Exactly(n) => write!(f, "{n} values"),
            Arity::Optional => f.write_str("at most 1 value"),
            Arity::OneOrMore => f.write_str("at least 1 value"),
            Arity::ZeroOrMore => f.write_str("any number of values"),
        }
    }
}

/// What kind of argument a declaration introduces.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgKind {
    Positional(Arity),
    Flag,
    Option { default: Value },
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSpec {
    pub name: String,
    pub kind: ArgKind,
    /// Literal tokens that select this argument. Empty for positionals.
    pub aliases: Vec<String>,
}

impl ArgumentSpec {
    pub fn matches(&self, token: &str) -> bool {
        self.aliases.iter().any(|a| a == token)
    }

    /// The kind values of this option are coerced to, `None` for other arguments.
    pub fn value_kind(&self) -> Option<ValueKind> {
        match &self.kind {
            ArgKind::Option { default } => Some(default.kind()),
            _ => None,
        }
    }

    /// Display form of this argument for usage lines and error messages.
    pub fn display_alias(&self) -> String {
        match self.aliases.iter().find(|a| a.starts_with("--")) {
            Some(long) => long.clone(),
            None => self.aliases.first().cloned().unwrap_or_else(|| self.name.clone()),
        }
    }
}

/// Anything that can name the aliases of a flag or option: a single spelling or a list.
pub trait IntoAliases {
    fn into_aliases(self) -> Vec<String>;
}

impl IntoAliases for &str {
    fn into_aliases(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoAliases for String {
    fn into_aliases(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoAliases for &[&str] {
    fn into_aliases(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoAliases for [&str; N] {
    fn into_aliases(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoAliases for Vec<&str> {
    fn into_aliases(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

/// Canonical argument name for a spelling: leading dashes dropped, `-` turned into `_`.
pub fn normalize_name(spelling: &str) -> String {
    spelling.trim_start_matches('-').replace('-', "_")
}

pub(crate) fn validate_name(name: &str) -> Result<(), SpecError> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(SpecError::InvalidName(name.to_string()))
    }
}

/// Turn a declared spelling into the literal token matched on the command line.
///
/// `verbose` becomes `--verbose`, `v` becomes `-v`, and underscores in long forms become dashes.
pub(crate) fn normalize_alias(spelling: &str) -> Result<String, SpecError> {
    let invalid = || SpecError::InvalidAlias(spelling.to_string());
    if spelling.contains('=') || spelling.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let bare = spelling.trim_start_matches('-');
    if bare.is_empty() {
        return Err(invalid());
    }
    let dashes = spelling.len() - bare.len();
    let alias = match (dashes, bare.chars().count()) {
        (0, 1) | (1, 1) => format!("-{bare}"),
        (0, _) | (2, _) => format!("--{}", bare.replace('_', "-")),
        (1, _) => format!("-{bare}"),
        _ => return Err(invalid()),
    };
    // `-1` or `-inf` on the command line is a number.
    if alias.parse::<f64>().is_ok() {
        return Err(invalid());
    }
    Ok(alias)
}

/// Pick the canonical name from a set of normalized aliases: the first long form wins.
pub(crate) fn name_from_aliases(aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .find(|a| a.starts_with("--"))
        .or_else(|| aliases.first())
        .map(|a| normalize_name(a))
}
