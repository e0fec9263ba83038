use std::fmt;

/// The type of an option, inferred from the literal given as its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Int,
    Float,
    Bool,
    List,
}

impl ValueKind {
    /// Placeholder shown in usage lines, e.g. `--port <int>`.
    pub fn placeholder(self) -> &'static str {
        match self {
            ValueKind::Str => "<value>",
            ValueKind::Int => "<int>",
            ValueKind::Float => "<number>",
            ValueKind::Bool => "<bool>",
            ValueKind::List => "<values>",
        }
    }

    /// Convert a command-line token into a value of this kind.
    ///
    /// Returns `None` when the token cannot be read as this kind. Booleans accept
    /// `true/false`, `yes/no`, `on/off` and `1/0`, case-insensitively.
    pub fn coerce(self, token: &str) -> Option<Value> {
        match self {
            ValueKind::Str => Some(Value::Str(token.to_string())),
            ValueKind::Int => token.trim().parse().ok().map(Value::Int),
            ValueKind::Float => token.trim().parse().ok().map(Value::Float),
            ValueKind::Bool => match token.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(Value::Bool(true)),
                "false" | "no" | "off" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueKind::List => Some(Value::List(vec![token.to_string()])),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Str => "string",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::List => "list",
        };
        f.write_str(name)
    }
}

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Str(_) => ValueKind::Str,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::List(_) => ValueKind::List,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::List(value)
    }
}
