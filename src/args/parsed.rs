use crate::args::spec::normalize_name;
use crate::args::value::Value;
use std::collections::BTreeMap;

/// The result of a successful parse: one value per declared argument.
///
/// Lookups accept either the canonical name (`dry_run`) or a dashed spelling (`--dry-run`).
/// Optional positionals that received no value are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    values: BTreeMap<String, Value>,
}

impl ParsedArgs {
    pub(crate) fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// True only for a boolean argument that is set. Unknown names read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(Value::Bool(true)))
    }

    /// Values bound by a multi-value positional. A single-value positional yields a
    /// one-element slice; unknown or absent names yield an empty one.
    pub fn list(&self, name: &str) -> &[String] {
        match self.get(name) {
            Some(Value::List(items)) => items,
            Some(Value::Str(s)) => std::slice::from_ref(s),
            _ => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
