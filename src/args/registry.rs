//! Argument registry: declarations accumulated before parsing.

use crate::args::parser::Parser;
use crate::args::spec::{
    ArgKind, ArgumentSpec, Arity, IntoAliases, name_from_aliases, normalize_alias, validate_name,
};
use crate::args::value::{Value, ValueKind};
use crate::error::SpecError;

/// Ordered set of argument declarations.
///
/// Declaration order is binding order for positionals. Every method validates the new
/// declaration against the ones already present, so a [`SpecError`] always points at the
/// offending call. Methods return `&mut Self` to allow chaining with `?`:
///
/// ```
/// use sesh::args::{Arity, Registry};
/// let mut reg = Registry::new();
/// reg.flag(["-v", "--verbose"])?
///     .option("port", 22)?
///     .positional("host", Arity::Exactly(1))?;
/// # Ok::<(), sesh::SpecError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    specs: Vec<ArgumentSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a positional argument binding `arity` values.
    pub fn positional(&mut self, name: &str, arity: Arity) -> Result<&mut Self, SpecError> {
        validate_name(name)?;
        self.check_name(name)?;
        if let Some(variable) = self.variable_positional() {
            return Err(SpecError::PositionalAfterVariable {
                variable: variable.name.clone(),
                declared: name.to_string(),
            });
        }
        self.specs.push(ArgumentSpec {
            name: name.to_string(),
            kind: ArgKind::Positional(arity),
            aliases: Vec::new(),
        });
        Ok(self)
    }

    /// Declare a boolean switch, `false` unless present.
    pub fn flag(&mut self, aliases: impl IntoAliases) -> Result<&mut Self, SpecError> {
        self.push_switch(aliases.into_aliases(), ArgKind::Flag)
    }

    /// Declare a key/value option whose type follows `default`.
    pub fn option(
        &mut self,
        aliases: impl IntoAliases,
        default: impl Into<Value>,
    ) -> Result<&mut Self, SpecError> {
        let default = default.into();
        let aliases = aliases.into_aliases();
        if default.kind() == ValueKind::List {
            let name = name_from_aliases(&aliases).unwrap_or_default();
            return Err(SpecError::ListDefault(name));
        }
        self.push_switch(aliases, ArgKind::Option { default })
    }

    pub fn specs(&self) -> &[ArgumentSpec] {
        &self.specs
    }

    /// Find the flag or option selected by a literal token.
    pub fn lookup(&self, token: &str) -> Option<&ArgumentSpec> {
        self.specs.iter().find(|spec| spec.matches(token))
    }

    pub fn positionals(&self) -> impl Iterator<Item = (&ArgumentSpec, Arity)> {
        self.specs.iter().filter_map(|spec| match spec.kind {
            ArgKind::Positional(arity) => Some((spec, arity)),
            _ => None,
        })
    }

    /// Render the expected command-line form.
    pub fn usage(&self, program: &str) -> String {
        let mut parts = vec![format!("usage: {program}")];
        for spec in &self.specs {
            let part = match &spec.kind {
                ArgKind::Flag => format!("[{}]", spec.aliases.join("|")),
                ArgKind::Option { default } => format!(
                    "[{} {}]",
                    spec.aliases.join("|"),
                    default.kind().placeholder()
                ),
                ArgKind::Positional(arity) => match arity {
                    Arity::Exactly(n) => vec![format!("<{}>", spec.name); *n].join(" "),
                    Arity::Optional => format!("[{}]", spec.name),
                    Arity::OneOrMore => format!("<{}>...", spec.name),
                    Arity::ZeroOrMore => format!("[{}...]", spec.name),
                },
            };
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts.join(" ")
    }

    /// Freeze the declarations and hand them to a parser.
    pub fn into_parser(self) -> Parser {
        Parser::new(self)
    }

    fn push_switch(&mut self, spellings: Vec<String>, kind: ArgKind) -> Result<&mut Self, SpecError> {
        let aliases = spellings
            .iter()
            .map(|s| normalize_alias(s))
            .collect::<Result<Vec<_>, _>>()?;
        let name = name_from_aliases(&aliases).ok_or(SpecError::NoAliases)?;
        validate_name(&name)?;
        self.check_name(&name)?;
        for (i, alias) in aliases.iter().enumerate() {
            if aliases[..i].contains(alias) {
                return Err(SpecError::DuplicateAlias {
                    alias: alias.clone(),
                    owner: name.clone(),
                });
            }
            if let Some(owner) = self.lookup(alias) {
                return Err(SpecError::DuplicateAlias {
                    alias: alias.clone(),
                    owner: owner.name.clone(),
                });
            }
        }
        self.specs.push(ArgumentSpec {
            name,
            kind,
            aliases,
        });
        Ok(self)
    }

    fn check_name(&self, name: &str) -> Result<(), SpecError> {
        if self.specs.iter().any(|spec| spec.name == name) {
            Err(SpecError::DuplicateName(name.to_string()))
        } else {
            Ok(())
        }
    }

    fn variable_positional(&self) -> Option<&ArgumentSpec> {
        self.positionals()
            .find(|(_, arity)| arity.is_variable())
            .map(|(spec, _)| spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_across_kinds() {
        let mut reg = Registry::new();
        reg.flag("verbose").unwrap();
        assert_eq!(
            reg.positional("verbose", Arity::Exactly(1)).unwrap_err(),
            SpecError::DuplicateName("verbose".to_string())
        );
        assert_eq!(
            reg.option("verbose", "x").unwrap_err(),
            SpecError::DuplicateName("verbose".to_string())
        );
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let mut reg = Registry::new();
        reg.flag(["-v", "--verbose"]).unwrap();
        let err = reg.option(["-v", "--version"], "1").unwrap_err();
        assert_eq!(
            err,
            SpecError::DuplicateAlias {
                alias: "-v".to_string(),
                owner: "verbose".to_string()
            }
        );
    }

    #[test]
    fn test_variable_positional_must_be_last() {
        let mut reg = Registry::new();
        reg.positional("target", Arity::Exactly(1))
            .unwrap()
            .positional("rest", Arity::OneOrMore)
            .unwrap();
        let err = reg.positional("late", Arity::Exactly(1)).unwrap_err();
        assert_eq!(
            err,
            SpecError::PositionalAfterVariable {
                variable: "rest".to_string(),
                declared: "late".to_string()
            }
        );
        assert!(reg.positional("more", Arity::ZeroOrMore).is_err());
    }

    #[test]
    fn test_switches_may_follow_variable_positional() {
        let mut reg = Registry::new();
        reg.positional("rest", Arity::ZeroOrMore).unwrap();
        assert!(reg.flag("verbose").is_ok());
        assert!(reg.option("port", 22).is_ok());
    }

    #[test]
    fn test_invalid_names_and_defaults() {
        let mut reg = Registry::new();
        assert_eq!(
            reg.positional("9lives", Arity::Exactly(1)).unwrap_err(),
            SpecError::InvalidName("9lives".to_string())
        );
        assert_eq!(reg.flag(Vec::<&str>::new()).unwrap_err(), SpecError::NoAliases);
        assert_eq!(
            reg.option("hosts", vec!["a".to_string()]).unwrap_err(),
            SpecError::ListDefault("hosts".to_string())
        );
        assert!(reg.specs().is_empty());
    }

    #[test]
    fn test_usage_line() {
        let mut reg = Registry::new();
        reg.flag(["-v", "--verbose"])
            .unwrap()
            .option("port", 22)
            .unwrap()
            .positional("host", Arity::Exactly(1))
            .unwrap()
            .positional("command", Arity::OneOrMore)
            .unwrap();
        assert_eq!(
            reg.usage("remote"),
            "usage: remote [-v|--verbose] [--port <int>] <host> <command>..."
        );
    }
}
