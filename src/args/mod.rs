//! Declarative argument engine.
//!
//! Arguments are declared on a [`Registry`], which is then consumed by a [`Parser`] to produce
//! [`ParsedArgs`]. Option types come from their defaults: `option("port", 22)` only accepts
//! integers on the command line.

mod parsed;
mod parser;
mod registry;
mod spec;
mod value;

pub use parsed::ParsedArgs;
pub use parser::{Parser, decode_tokens};
pub use registry::Registry;
pub use spec::{ArgKind, ArgumentSpec, Arity, IntoAliases, normalize_name};
pub use value::{Value, ValueKind};
