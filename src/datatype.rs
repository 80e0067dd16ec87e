//! The datatype algebra (C2): parsing raw `.conf` scalars/lists into typed
//! values, and formatting typed values back for the default-`.conf` writer.
//!
//! A closed, tagged enum rather than an open type registry: every datatype
//! this crate supports is a variant here, matching spec.md §4.2's "small but
//! extensible datatype algebra". `Enum` matches allowed values verbatim (no
//! case-folding), against a plain `BTreeSet<String>` allow-list.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::value::{RawValue, TypedValue};

/// A plug-in capability object for the `Custom` datatype (spec.md §3, §9 —
/// "custom datatypes are opaque capability objects, not strings").
pub trait CustomType: fmt::Debug + Send + Sync {
    /// Stable module name, used in `CustomTypeError` (spec.md §7).
    fn name(&self) -> &str;

    /// Parses a raw `.conf` value into a typed value, or fails with a
    /// human-readable reason.
    fn parse(&self, raw: &RawValue) -> Result<TypedValue, String>;

    /// Formats a typed value for the default-`.conf` writer.
    fn format(&self, value: &TypedValue) -> String;

    /// Optional documentation appended to the writer's output for settings
    /// using this datatype.
    fn doc(&self) -> Option<String> {
        None
    }
}

/// The datatype tag attached to each schema mapping (spec.md §3).
#[derive(Debug, Clone)]
pub enum Datatype {
    Atom,
    Binary,
    CharList,
    Boolean,
    Integer,
    Float,
    Ip,
    Enum(BTreeSet<String>),
    List(Box<Datatype>),
    /// Format-only: a list whose elements are themselves lists (spec.md
    /// §4.2 calls this out explicitly — it has no `.conf` parse form).
    NestedList(Box<Datatype>),
    PairedAtom(Box<Datatype>),
    /// Marks a mapping as an aggregation target for C5; never parsed
    /// directly by the coercer (spec.md §4.4 skips `Complex`-tagged
    /// mappings, leaving their matching entries for the aggregator).
    Complex,
    Custom(Arc<dyn CustomType>),
}

impl PartialEq for Datatype {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Atom, Self::Atom)
            | (Self::Binary, Self::Binary)
            | (Self::CharList, Self::CharList)
            | (Self::Boolean, Self::Boolean)
            | (Self::Integer, Self::Integer)
            | (Self::Float, Self::Float)
            | (Self::Ip, Self::Ip)
            | (Self::Complex, Self::Complex) => true,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::NestedList(a), Self::NestedList(b)) => a == b,
            (Self::PairedAtom(a), Self::PairedAtom(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom => f.write_str("atom"),
            Self::Binary => f.write_str("binary"),
            Self::CharList => f.write_str("charlist"),
            Self::Boolean => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Ip => f.write_str("ip"),
            Self::Enum(values) => {
                write!(f, "enum({})", values.iter().cloned().collect::<Vec<_>>().join("|"))
            }
            Self::List(inner) => write!(f, "list({inner})"),
            Self::NestedList(inner) => write!(f, "nested_list({inner})"),
            Self::PairedAtom(inner) => write!(f, "paired_atom({inner})"),
            Self::Complex => f.write_str("complex"),
            Self::Custom(c) => write!(f, "custom({})", c.name()),
        }
    }
}

fn scalar_str(raw: &RawValue) -> Result<&str, String> {
    match raw {
        RawValue::Scalar(s) => Ok(s),
        RawValue::List(_) => Err("expected a scalar, got a comma-separated list".to_owned()),
        RawValue::PairList(_) => Err("expected a scalar, got a bracketed list".to_owned()),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn split_host_port(s: &str) -> Result<(String, String), String> {
    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected `host:port`, got `{s}`"))?;
    if host.is_empty() || port.is_empty() {
        return Err(format!("expected `host:port`, got `{s}`"));
    }
    Ok((host.to_owned(), port.to_owned()))
}

impl Datatype {
    /// Parses a raw `.conf` value per the rules in spec.md §4.2. `Complex`
    /// is never dispatched here directly — it is consumed entirely by the
    /// aggregator (C5) — but a direct call returns a descriptive error
    /// rather than panicking, in case a schema mis-declares a plain mapping
    /// with it.
    pub fn parse(&self, raw: &RawValue) -> Result<TypedValue, String> {
        match self {
            Self::Atom => Ok(TypedValue::Atom(scalar_str(raw)?.trim().to_owned())),
            Self::Binary => Ok(TypedValue::Str(scalar_str(raw)?.to_owned())),
            Self::CharList => Ok(TypedValue::CharList(scalar_str(raw)?.chars().collect())),
            Self::Boolean => match scalar_str(raw)?.trim() {
                "true" => Ok(TypedValue::Bool(true)),
                "false" => Ok(TypedValue::Bool(false)),
                other => Err(format!("expected `true` or `false`, got `{other}`")),
            },
            Self::Integer => {
                let s = scalar_str(raw)?.trim();
                s.parse::<i64>().map(TypedValue::Int).map_err(|e| format!("invalid integer `{s}`: {e}"))
            }
            Self::Float => {
                let s = scalar_str(raw)?.trim();
                s.parse::<f64>().map(TypedValue::Float).map_err(|e| format!("invalid float `{s}`: {e}"))
            }
            Self::Ip => {
                let (host, port) = split_host_port(scalar_str(raw)?.trim())?;
                Ok(TypedValue::Pair(host, port))
            }
            Self::Enum(allowed) => {
                let value = scalar_str(raw)?.trim().to_owned();
                if allowed.contains(&value) {
                    Ok(TypedValue::Atom(value))
                } else {
                    let choices: Vec<_> = allowed.iter().cloned().collect();
                    Err(format!("`{value}` is not one of the allowed values: {}", choices.join(", ")))
                }
            }
            Self::List(inner) => match raw {
                RawValue::List(items) => items
                    .iter()
                    .map(|item| inner.parse(&RawValue::Scalar(item.clone())))
                    .collect::<Result<Vec<_>, _>>()
                    .map(TypedValue::List),
                RawValue::Scalar(single) => {
                    inner.parse(&RawValue::Scalar(single.clone())).map(|v| TypedValue::List(vec![v]))
                }
                RawValue::PairList(pairs) => {
                    if let Self::PairedAtom(value_ty) = inner.as_ref() {
                        pairs
                            .iter()
                            .map(|(key, value)| {
                                value_ty
                                    .parse(&RawValue::Scalar(value.clone()))
                                    .map(|v| TypedValue::AtomPair(key.clone(), Box::new(v)))
                            })
                            .collect::<Result<Vec<_>, _>>()
                            .map(TypedValue::List)
                    } else {
                        Err("expected a comma-separated list, got a bracketed list".to_owned())
                    }
                }
            },
            Self::NestedList(_) => {
                Err("nested_list is a write-only datatype and has no `.conf` parse form".to_owned())
            }
            Self::PairedAtom(inner) => match raw {
                RawValue::PairList(pairs) if pairs.len() == 1 => {
                    let (key, value) = &pairs[0];
                    inner
                        .parse(&RawValue::Scalar(value.clone()))
                        .map(|v| TypedValue::AtomPair(key.clone(), Box::new(v)))
                }
                RawValue::Scalar(s) => {
                    let (key, value) = s
                        .split_once('=')
                        .ok_or_else(|| format!("expected `key = value`, got `{s}`"))?;
                    inner
                        .parse(&RawValue::Scalar(value.trim().to_owned()))
                        .map(|v| TypedValue::AtomPair(key.trim().to_owned(), Box::new(v)))
                }
                _ => Err("expected a single `key = value` pair".to_owned()),
            },
            Self::Complex => Err("complex is an aggregation marker and cannot be parsed directly".to_owned()),
            Self::Custom(custom) => custom.parse(raw),
        }
    }

    /// Formats a typed value for the default-`.conf` writer (C8), per
    /// spec.md §4.8. Assumes `value` actually came from this datatype (the
    /// coercer/aggregator guarantee this); mismatches fall back to a
    /// best-effort rendering rather than panicking.
    pub fn format(&self, value: &TypedValue) -> String {
        match (self, value) {
            (Self::Atom | Self::Enum(_), TypedValue::Atom(a)) => a.clone(),
            (Self::Binary, TypedValue::Str(s)) => s.clone(),
            (Self::CharList, TypedValue::CharList(cs)) => cs.iter().collect(),
            (Self::Boolean, TypedValue::Bool(b)) => b.to_string(),
            (Self::Integer, TypedValue::Int(i)) => i.to_string(),
            (Self::Float, TypedValue::Float(v)) => format_float(*v),
            (Self::Ip, TypedValue::Pair(host, port)) => format!("{host}:{port}"),
            (Self::List(inner), TypedValue::List(items)) => items
                .iter()
                .map(|item| inner.format(item))
                .collect::<Vec<_>>()
                .join(", "),
            (Self::NestedList(inner), TypedValue::List(items)) => items
                .iter()
                .map(|item| match item {
                    TypedValue::List(inner_items) => format!(
                        "[{}]",
                        inner_items.iter().map(|v| inner.format(v)).collect::<Vec<_>>().join(", ")
                    ),
                    other => inner.format(other),
                })
                .collect::<Vec<_>>()
                .join(", "),
            (Self::PairedAtom(inner), TypedValue::AtomPair(key, inner_value)) => {
                format!("{key} = {}", inner.format(inner_value))
            }
            (Self::Custom(custom), v) => custom.format(v),
            (_, TypedValue::Str(s)) => s.clone(),
            (_, other) => format!("{other:?}"),
        }
    }

    pub fn doc_suffix(&self) -> Option<String> {
        match self {
            Self::Enum(values) => {
                let choices: Vec<_> = values.iter().cloned().collect();
                Some(format!("Allowed values: {}", choices.join(", ")))
            }
            Self::Custom(custom) => custom.doc(),
            _ => None,
        }
    }
}
