//! C3: the schema model — mappings, translations, and the normalized
//! [`Schema`] built from them.
//!
//! Schema construction is a fallible, invariant-checked build step threaded
//! through `anyhow::Result` internally (bailing on shape violations while
//! resolving/sorting mappings), converted to `Error::SchemaShape` once it
//! crosses the public boundary.

use std::sync::Arc;

use crate::datatype::Datatype;
use crate::value::{KeyPath, TypedValue};
use crate::Error;

/// A single `(host key) -> (translated key, datatype, default)` schema
/// entry, as declared by the host application (spec.md §3, §6).
#[derive(Debug, Clone)]
pub struct MappingSpec {
    pub key: String,
    pub to: Option<String>,
    pub datatype: Datatype,
    pub default: Option<TypedValue>,
    pub doc: String,
}

impl MappingSpec {
    pub fn new(key: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            key: key.into(),
            to: None,
            datatype,
            default: None,
            doc: String::new(),
        }
    }

    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    #[must_use]
    pub fn default(mut self, value: TypedValue) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// Translation function arity, per spec.md §4.6: arity-2 sees only the
/// matched `(key, value)`; arity-3 additionally sees a read-only snapshot of
/// the working table as translated so far, letting a translation consult
/// sibling results (the accumulator).
#[derive(Clone)]
pub enum TranslationFn {
    Arity2(Arc<dyn Fn(&str, &TypedValue) -> TypedValue + Send + Sync>),
    Arity3(Arc<dyn Fn(&str, &TypedValue, &[(KeyPath, TypedValue)]) -> TypedValue + Send + Sync>),
}

impl std::fmt::Debug for TranslationFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arity2(_) => f.write_str("TranslationFn::Arity2(..)"),
            Self::Arity3(_) => f.write_str("TranslationFn::Arity3(..)"),
        }
    }
}

/// A translation function bound to a mapping key (spec.md §3, §4.6).
#[derive(Debug, Clone)]
pub struct TranslationSpec {
    pub key: String,
    pub func: TranslationFn,
}

impl TranslationSpec {
    pub fn new(key: impl Into<String>, func: TranslationFn) -> Self {
        Self { key: key.into(), func }
    }
}

/// A normalized mapping, keyed and sorted for coercion priority.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub key: KeyPath,
    pub to: KeyPath,
    pub datatype: Datatype,
    pub default: Option<TypedValue>,
    pub doc: String,
}

/// A normalized translation.
#[derive(Clone)]
pub struct Translation {
    pub key: KeyPath,
    pub func: TranslationFn,
}

impl std::fmt::Debug for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translation").field("key", &self.key).finish_non_exhaustive()
    }
}

/// The external interface's raw schema object: "a structured object with two
/// fields" (spec.md §6). Both fields are optional at the type level so that
/// [`Error::SchemaShape`] ("schema is missing `mappings` or `translations`
/// keys", spec.md §7) is actually reachable, rather than a dead error
/// variant — see DESIGN.md.
#[derive(Debug, Clone, Default)]
pub struct RawSchema {
    pub mappings: Option<Vec<MappingSpec>>,
    pub translations: Option<Vec<TranslationSpec>>,
}

/// The normalized, immutable schema consulted by every later pass.
///
/// Cheap to clone (an `Arc`-backed `Datatype::Custom` aside, the rest is
/// small owned data); callers share one built `Schema` across many
/// `translate` calls.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Mappings sorted by descending key length, then by descending literal
    /// segment count, so more specific mappings are tried — and claim a
    /// working-table entry — before less specific (more wildcard-heavy)
    /// ones of the same length (spec.md §8's "wildcard specificity"
    /// property: `a.b.c` must win over `a.*.c`).
    mappings: Vec<Mapping>,
    /// Indices into `mappings`, in original declaration order, used by the
    /// writer (C8) so default-`.conf` output reads in the order the host
    /// application declared its settings rather than priority order.
    declaration_order: Vec<usize>,
    translations: Vec<Translation>,
}

impl Schema {
    /// Builds a schema straight from pre-normalized parts (the common case:
    /// the host already has `Vec<MappingSpec>`/`Vec<TranslationSpec>` handy).
    pub fn from_parts(mappings: Vec<MappingSpec>, translations: Vec<TranslationSpec>) -> Result<Self, Error> {
        Self::build(mappings, translations)
    }

    /// Builds a schema from the "structured object with two fields" shape
    /// described in spec.md §6, failing with [`Error::SchemaShape`] if
    /// either field is absent.
    pub fn from_raw(raw: RawSchema) -> Result<Self, Error> {
        let mappings = raw
            .mappings
            .ok_or_else(|| Error::schema_shape("schema is missing the `mappings` key"))?;
        let translations = raw
            .translations
            .ok_or_else(|| Error::schema_shape("schema is missing the `translations` key"))?;
        Self::build(mappings, translations)
    }

    fn build(mappings: Vec<MappingSpec>, translations: Vec<TranslationSpec>) -> Result<Self, Error> {
        let normalized = Self::normalize(mappings).map_err(Error::from)?;
        let mut indexed: Vec<(usize, Mapping)> = normalized.into_iter().enumerate().collect();

        // Stable sort so original declaration order acts as the final
        // tie-break among equally-specific mappings.
        indexed.sort_by(|(_, a), (_, b)| {
            b.key
                .len()
                .cmp(&a.key.len())
                .then_with(|| literal_segment_count(&b.key).cmp(&literal_segment_count(&a.key)))
        });

        let declaration_order = {
            let mut order: Vec<(usize, usize)> =
                indexed.iter().enumerate().map(|(sorted_idx, (orig_idx, _))| (*orig_idx, sorted_idx)).collect();
            order.sort_by_key(|(orig_idx, _)| *orig_idx);
            order.into_iter().map(|(_, sorted_idx)| sorted_idx).collect()
        };

        let mappings: Vec<Mapping> = indexed.into_iter().map(|(_, m)| m).collect();

        let translations = translations
            .into_iter()
            .map(|t| Translation { key: KeyPath::from_dotted(&t.key), func: t.func })
            .collect();

        Ok(Self { mappings, declaration_order, translations })
    }

    fn normalize(specs: Vec<MappingSpec>) -> anyhow::Result<Vec<Mapping>> {
        let mut out = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.key.trim().is_empty() {
                anyhow::bail!("mapping has an empty key");
            }
            let key = KeyPath::from_dotted(&spec.key);
            let to = spec.to.as_deref().map(KeyPath::from_dotted).unwrap_or_else(|| key.clone());
            out.push(Mapping { key, to, datatype: spec.datatype, default: spec.default, doc: spec.doc });
        }
        Ok(out)
    }

    /// Mappings in coercion/aggregation priority order (most specific
    /// first).
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Mappings in the order they were originally declared (for the
    /// default-`.conf` writer).
    pub fn mappings_in_declaration_order(&self) -> impl Iterator<Item = &Mapping> {
        self.declaration_order.iter().map(move |&idx| &self.mappings[idx])
    }

    pub fn translations(&self) -> &[Translation] {
        &self.translations
    }

    /// Finds the (single, most-specific) mapping with this exact key, used
    /// by the translator to resolve a translation's target mapping
    /// (spec.md §4.6).
    pub fn mapping_with_key(&self, key: &KeyPath) -> Option<&Mapping> {
        self.mappings.iter().find(|m| &m.key == key)
    }
}

fn literal_segment_count(key: &KeyPath) -> usize {
    key.segments().iter().filter(|seg| !seg.is_wildcard()).count()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn from_raw_requires_both_fields() {
        let err = Schema::from_raw(RawSchema::default()).unwrap_err();
        assert_matches!(err, Error::SchemaShape { .. });
    }

    #[test]
    fn mappings_sort_more_specific_first() {
        let schema = Schema::from_parts(
            vec![
                MappingSpec::new("a.*.c", Datatype::Binary),
                MappingSpec::new("a.b.c", Datatype::Binary),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(schema.mappings()[0].key.to_dotted(), "a.b.c");
        assert_eq!(schema.mappings()[1].key.to_dotted(), "a.*.c");
    }

    #[test]
    fn declaration_order_is_preserved_for_writer() {
        let schema = Schema::from_parts(
            vec![
                MappingSpec::new("z.setting", Datatype::Binary),
                MappingSpec::new("a.setting", Datatype::Binary),
            ],
            vec![],
        )
        .unwrap();
        let keys: Vec<_> = schema.mappings_in_declaration_order().map(|m| m.key.to_dotted()).collect();
        assert_eq!(keys, vec!["z.setting".to_owned(), "a.setting".to_owned()]);
    }

    #[test]
    fn rejects_empty_mapping_key() {
        let err = Schema::from_parts(vec![MappingSpec::new("", Datatype::Binary)], vec![]).unwrap_err();
        assert_matches!(err, Error::SchemaShape { .. });
    }
}
