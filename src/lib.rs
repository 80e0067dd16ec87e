//! Schema-driven translation between flat, sysctl-style `.conf` text and a
//! nested configuration term tree.
//!
//! A [`Schema`] declares, per setting, how a dotted `.conf` key maps to a
//! [`Datatype`], an optional default, and an optional destination path in
//! the output tree; optional translation functions can further transform a
//! coerced value before it's placed in the tree. [`Engine::translate`] runs
//! the whole pipeline (parse → coerce → aggregate → translate → build) over
//! one `.conf` document; [`Engine::write_default_conf`] renders a schema
//! back out as an annotated default `.conf` document.
//!
//! ```
//! use cuttle_schema::{Datatype, Engine, MappingSpec, Schema};
//!
//! let schema = Schema::from_parts(
//!     vec![MappingSpec::new("log.level", Datatype::Atom)],
//!     vec![],
//! ).unwrap();
//! let engine = Engine::new(schema);
//! let tree = engine.translate_standalone("log.level = info\n").unwrap();
//! assert!(tree.get("log").is_some());
//! ```

mod aggregate;
mod coerce;
mod conf;
mod datatype;
mod engine;
mod error;
mod schema;
mod table;
mod term;
mod translate;
pub mod testing;
mod value;
mod writer;

pub use datatype::{CustomType, Datatype};
pub use engine::Engine;
pub use error::Error;
pub use schema::{Mapping, MappingSpec, RawSchema, Schema, Translation, TranslationFn, TranslationSpec};
pub use value::{KeyPath, OrderedMap, RawValue, Segment, TermNode, TermTree, TypedValue};
pub use writer::write_default;

/// Parses a `.conf` document into its flat, untyped `(key, value)` pairs
/// without running it through a schema — exposed for callers who want to
/// inspect C1's output directly (e.g. linting tools).
pub fn parse_conf(input: &str) -> Result<Vec<(KeyPath, RawValue)>, Error> {
    conf::parse(input)
}
