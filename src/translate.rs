//! C6: the translator — for each declared translation, finds its matching
//! mapping, invokes the translation function over every currently-typed
//! entry the mapping claims, and replaces that entry's value in place.
//!
//! The function is called with `leaf_key` — the last segment of the result
//! key, as an atom — not the full dotted path (spec.md §4.6).
//!
//! spec.md §4.6 also describes truncating the result's key by one segment
//! before reinserting it; the worked example in spec.md §8 (`log.level`
//! translating `info` to `6` and landing back under `log.level`, not the
//! truncated `log`) contradicts that reading directly. This crate follows
//! the worked example — replace the value in place, keep the key — since an
//! end-to-end scenario is harder to get wrong by accident than a single
//! sentence of prose; see DESIGN.md for the full writeup of this
//! discrepancy.

use tracing::{debug, instrument, warn};

use crate::schema::Schema;
use crate::table::{Entry, WorkingTable};
use crate::value::Segment;
use crate::Error;

/// Runs C6 over `table` in place, in translation-declaration order.
#[instrument(level = "debug", skip_all)]
pub(crate) fn run(table: &mut WorkingTable, schema: &Schema) -> Result<(), Error> {
    for translation in schema.translations() {
        let Some(mapping) = schema.mapping_with_key(&translation.key) else {
            warn!(key = %translation.key, "translation has no matching mapping; skipping");
            continue;
        };

        for (idx, key, value) in table.matching_typed(&mapping.key) {
            let leaf_key = key.last().map(Segment::to_string).unwrap_or_default();
            let new_value = match &translation.func {
                crate::schema::TranslationFn::Arity2(f) => f(&leaf_key, &value),
                crate::schema::TranslationFn::Arity3(f) => {
                    let snapshot = table.typed_snapshot();
                    f(&leaf_key, &value, &snapshot)
                }
            };
            table.replace_at(idx, key, Entry::Typed(new_value));
        }
    }

    debug!(entries = table.len(), "translation pass complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::schema::{MappingSpec, Schema, TranslationFn, TranslationSpec};
    use crate::table::WorkingTable;
    use crate::value::{KeyPath, RawValue, TypedValue};
    use crate::Datatype;

    use super::*;

    #[test]
    fn arity2_translation_replaces_value_at_same_key() {
        let schema = Schema::from_parts(
            vec![MappingSpec::new("log.level", Datatype::Atom)],
            vec![TranslationSpec::new(
                "log.level",
                TranslationFn::Arity2(Arc::new(|_key, value| match value {
                    TypedValue::Atom(a) if a == "info" => TypedValue::Int(6),
                    other => other.clone(),
                })),
            )],
        )
        .unwrap();

        let mut table = WorkingTable::from_pairs(vec![(
            KeyPath::from_dotted("log.level"),
            RawValue::Scalar("info".into()),
        )]);
        crate::coerce::run(&mut table, &schema).unwrap();
        run(&mut table, &schema).unwrap();

        assert_eq!(
            table.get(&KeyPath::from_dotted("log.level")),
            Some(&crate::table::Entry::Typed(TypedValue::Int(6)))
        );
    }

    #[test]
    fn translation_function_receives_the_leaf_segment_not_the_full_path() {
        let schema = Schema::from_parts(
            vec![MappingSpec::new("log.level", Datatype::Atom)],
            vec![TranslationSpec::new(
                "log.level",
                TranslationFn::Arity2(Arc::new(|key, value| {
                    assert_eq!(key, "level");
                    value.clone()
                })),
            )],
        )
        .unwrap();

        let mut table = WorkingTable::from_pairs(vec![(
            KeyPath::from_dotted("log.level"),
            RawValue::Scalar("info".into()),
        )]);
        crate::coerce::run(&mut table, &schema).unwrap();
        run(&mut table, &schema).unwrap();
    }

    #[test]
    fn translation_without_matching_mapping_is_skipped() {
        let schema = Schema::from_parts(
            vec![],
            vec![TranslationSpec::new(
                "missing.key",
                TranslationFn::Arity2(Arc::new(|_key, value| value.clone())),
            )],
        )
        .unwrap();
        let mut table = WorkingTable::default();
        run(&mut table, &schema).unwrap();
        assert!(table.is_empty());
    }
}
