//! The crate-wide error type.
//!
//! No `thiserror`: hand-rolled `Display`/`Debug`/`std::error::Error` impls
//! and builder-style constructors.

use std::fmt;

/// Everything that can go wrong while parsing, coercing, aggregating,
/// translating, or building a schema (spec.md §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A `.conf` document could not be parsed.
    Parse { line: usize, message: String },
    /// A raw value could not be coerced to a setting's declared datatype.
    Coerce {
        setting: String,
        datatype: String,
        reason: String,
    },
    /// The schema itself is malformed (missing fields, unresolvable
    /// mapping/translation references).
    SchemaShape { message: String },
    /// A translation function failed or referenced a nonexistent setting.
    Translation { key: String, reason: String },
    /// A custom datatype's plug-in capability object failed.
    CustomType { module: String, reason: String },
}

impl Error {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse { line, message: message.into() }
    }

    pub fn coerce(setting: impl Into<String>, datatype: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Coerce {
            setting: setting.into(),
            datatype: datatype.into(),
            reason: reason.into(),
        }
    }

    pub fn schema_shape(message: impl Into<String>) -> Self {
        Self::SchemaShape { message: message.into() }
    }

    pub fn translation(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Translation { key: key.into(), reason: reason.into() }
    }

    pub fn custom_type(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CustomType { module: module.into(), reason: reason.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { line, message } => {
                write!(f, "parse error on line {line}: {message}")
            }
            Self::Coerce { setting, datatype, reason } => {
                write!(f, "cannot coerce `{setting}` to `{datatype}`: {reason}")
            }
            Self::SchemaShape { message } => write!(f, "malformed schema: {message}"),
            Self::Translation { key, reason } => {
                write!(f, "translation for `{key}` failed: {reason}")
            }
            Self::CustomType { module, reason } => {
                write!(f, "custom datatype `{module}` failed: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    /// Schema-building invariants are checked with `anyhow` internally, then
    /// surfaced at the public boundary as a `SchemaShape` error.
    fn from(err: anyhow::Error) -> Self {
        Self::schema_shape(err.to_string())
    }
}
