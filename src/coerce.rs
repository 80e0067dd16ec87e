//! C4: the coercer — walks mappings in priority order, typing matching raw
//! entries and substituting defaults for literal mappings with no matching
//! `.conf` entry.
//!
//! `Complex`/`List(Complex)` mappings are skipped entirely here: they carry
//! no parseable scalar shape of their own and are handled in full by the
//! aggregator (`aggregate.rs`).

use tracing::{debug, instrument, trace};

use crate::datatype::Datatype;
use crate::schema::Schema;
use crate::table::{Entry, WorkingTable};
use crate::Error;

fn is_aggregation_marker(datatype: &Datatype) -> bool {
    matches!(datatype, Datatype::Complex) || matches!(datatype, Datatype::List(inner) if is_aggregation_marker(inner))
}

/// Runs C4 over `table` in place.
#[instrument(level = "debug", skip_all)]
pub(crate) fn run(table: &mut WorkingTable, schema: &Schema) -> Result<(), Error> {
    for mapping in schema.mappings() {
        if is_aggregation_marker(&mapping.datatype) {
            continue;
        }

        for idx in table.matching_raw_indices(&mapping.key) {
            let (key, entry) = &table.entries()[idx];
            let setting = key.to_dotted();
            let raw = entry.as_raw().expect("matching_raw_indices only returns untyped entries").clone();
            let key = key.clone();
            let typed = mapping
                .datatype
                .parse(&raw)
                .map_err(|reason| Error::coerce(setting.clone(), mapping.datatype.to_string(), reason))?;
            trace!(setting = %setting, datatype = %mapping.datatype, "coerced setting");
            table.replace_at(idx, key, Entry::Typed(typed));
        }

        if mapping.key.is_literal() && !table.contains(&mapping.key) {
            if let Some(default) = &mapping.default {
                trace!(key = %mapping.key, "substituting default for missing setting");
                table.set(mapping.key.clone(), Entry::Typed(default.clone()));
            }
        }
    }

    debug!(entries = table.len(), "coercion pass complete");
    Ok(())
}
