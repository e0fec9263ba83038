//! Token scanning and positional distribution.

use crate::args::parsed::ParsedArgs;
use crate::args::registry::Registry;
use crate::args::spec::{ArgKind, Arity};
use crate::args::value::Value;
use crate::error::ParseError;
use std::collections::{BTreeMap, VecDeque};
use std::ffi::OsString;

/// Consumes a [`Registry`] and turns a token list into [`ParsedArgs`].
///
/// Parsing takes `self` by value: a registry is good for exactly one parse.
#[derive(Debug, Clone)]
pub struct Parser {
    registry: Registry,
}

impl Parser {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parse `tokens` (program name excluded).
    pub fn parse<I, S>(self, tokens: I) -> Result<ParsedArgs, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values = self.defaults();
        let candidates = self.scan(tokens, &mut values)?;
        self.distribute(candidates, &mut values)?;
        Ok(ParsedArgs::new(values))
    }

    fn defaults(&self) -> BTreeMap<String, Value> {
        self.registry
            .specs()
            .iter()
            .filter_map(|spec| match &spec.kind {
                ArgKind::Flag => Some((spec.name.clone(), Value::Bool(false))),
                ArgKind::Option { default } => Some((spec.name.clone(), default.clone())),
                ArgKind::Positional(_) => None,
            })
            .collect()
    }

    /// Consume flags and options, returning the positional candidates in order.
    fn scan<I, S>(
        &self,
        tokens: I,
        values: &mut BTreeMap<String, Value>,
    ) -> Result<Vec<String>, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut candidates = Vec::new();
        let mut tokens = tokens.into_iter().map(Into::into);
        let mut only_positionals = false;

        while let Some(token) = tokens.next() {
            if only_positionals || !self.is_switch(&token) {
                candidates.push(token);
                continue;
            }
            if token == "--" {
                only_positionals = true;
                continue;
            }

            let (switch, inline) = match token.split_once('=') {
                Some((switch, value)) => (switch, Some(value.to_string())),
                None => (token.as_str(), None),
            };

            let Some(spec) = self.registry.lookup(switch) else {
                if switch == "-h" || switch == "--help" {
                    return Err(ParseError::HelpRequested);
                }
                return Err(ParseError::UnknownSwitch(token));
            };

            match &spec.kind {
                ArgKind::Flag => {
                    if inline.is_some() {
                        return Err(ParseError::FlagWithValue {
                            flag: switch.to_string(),
                            token,
                        });
                    }
                    values.insert(spec.name.clone(), Value::Bool(true));
                }
                ArgKind::Option { default } => {
                    let raw = match inline {
                        Some(raw) => raw,
                        None => match tokens.next() {
                            Some(next) if !self.is_switch(&next) => next,
                            found => {
                                return Err(ParseError::MissingValue {
                                    option: switch.to_string(),
                                    found,
                                });
                            }
                        },
                    };
                    let kind = default.kind();
                    let value = kind.coerce(&raw).ok_or_else(|| ParseError::Coercion {
                        option: switch.to_string(),
                        token: raw.clone(),
                        expected: kind,
                    })?;
                    values.insert(spec.name.clone(), value);
                }
                ArgKind::Positional(_) => unreachable!("positionals have no aliases"),
            }
        }

        Ok(candidates)
    }

    /// Declared aliases are always switches; anything else goes through [`looks_like_switch`].
    fn is_switch(&self, token: &str) -> bool {
        let switch = token.split_once('=').map_or(token, |(switch, _)| switch);
        self.registry.lookup(switch).is_some() || looks_like_switch(token)
    }

    /// Hand out candidates to positionals in declaration order.
    fn distribute(
        &self,
        candidates: Vec<String>,
        values: &mut BTreeMap<String, Value>,
    ) -> Result<(), ParseError> {
        let mut remaining: VecDeque<String> = candidates.into();

        for (spec, arity) in self.registry.positionals() {
            let missing = |found| ParseError::MissingPositional {
                name: spec.name.clone(),
                expected: arity.to_string(),
                found,
            };
            let value = match arity {
                Arity::Exactly(n) => {
                    if remaining.len() < n {
                        return Err(missing(remaining.len()));
                    }
                    let taken: Vec<String> = remaining.drain(..n).collect();
                    if n == 1 {
                        taken.into_iter().next().map(Value::Str)
                    } else {
                        Some(Value::List(taken))
                    }
                }
                Arity::Optional => remaining.pop_front().map(Value::Str),
                Arity::OneOrMore => {
                    if remaining.is_empty() {
                        return Err(missing(0));
                    }
                    Some(Value::List(remaining.drain(..).collect()))
                }
                Arity::ZeroOrMore => Some(Value::List(remaining.drain(..).collect())),
            };
            if let Some(value) = value {
                values.insert(spec.name.clone(), value);
            }
        }

        if remaining.is_empty() {
            Ok(())
        } else {
            Err(ParseError::UnexpectedPositionals(remaining.into()))
        }
    }
}

/// Turn raw process arguments into tokens. The first one that is not valid UTF-8 is an
/// error carrying its lossy form.
pub fn decode_tokens<I>(args: I) -> Result<Vec<String>, ParseError>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|raw| ParseError::InvalidUtf8(raw.to_string_lossy().into_owned()))
        })
        .collect()
}

/// A token names a flag or option when it starts with `-`, is longer than `-` itself, and is
/// not a number. Option values are never allowed to look like this; use `--name=value` for
/// values that must start with a dash.
fn looks_like_switch(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && token.parse::<f64>().is_err()
}
