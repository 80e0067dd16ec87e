//! Testing helpers for hosts embedding this crate.
//!
//! Small, ergonomic wrappers around the real pipeline rather than a
//! parallel test harness, so a passing test actually exercises the same
//! code path as a production call.

use crate::engine::Engine;
use crate::schema::{MappingSpec, Schema, TranslationSpec};
use crate::value::TermTree;
use crate::Error;

/// Builds a schema from mapping/translation specs and runs it over `conf`
/// against an empty baseline in one call — the common case for a unit test
/// that only cares about one or two settings.
pub fn translate_str(
    mappings: Vec<MappingSpec>,
    translations: Vec<TranslationSpec>,
    conf: &str,
) -> Result<TermTree, Error> {
    let schema = Schema::from_parts(mappings, translations)?;
    Engine::new(schema).translate_standalone(conf)
}

/// Declares a small set of mappings inline, for schemas that don't need
/// translations, the same way a `key: value` literal macro builds test
/// fixtures without repeating a builder call per entry.
///
/// ```
/// use cuttle_schema::{schema, Datatype};
///
/// let mappings = schema! {
///     "log.level": Datatype::Atom,
///     "http.port": Datatype::Integer,
/// };
/// assert_eq!(mappings.len(), 2);
/// ```
#[macro_export]
macro_rules! schema {
    ($($key:literal : $datatype:expr),* $(,)?) => {
        vec![$($crate::MappingSpec::new($key, $datatype)),*]
    };
}
