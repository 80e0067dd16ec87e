//! C8: the default-`.conf` writer — renders a schema's mappings back out as
//! an annotated, commented-out (or defaulted) `.conf` document, in the
//! order mappings were originally declared (spec.md §4.8).

use std::fmt::Write as _;

use crate::datatype::Datatype;
use crate::schema::{Mapping, Schema};

/// Renders `schema` as a complete default `.conf` document.
pub fn write_default(schema: &Schema) -> String {
    let mut out = String::new();
    for mapping in schema.mappings_in_declaration_order() {
        write_mapping(&mut out, mapping);
        out.push('\n');
    }
    out
}

fn write_mapping(out: &mut String, mapping: &Mapping) {
    for line in mapping.doc.lines() {
        let _ = writeln!(out, "# {line}");
    }
    if let Some(suffix) = mapping.datatype.doc_suffix() {
        let _ = writeln!(out, "# {suffix}");
    }

    let key = mapping.key.to_dotted();
    match &mapping.default {
        Some(default) => {
            let _ = writeln!(out, "{key} = {}", mapping.datatype.format(default));
        }
        None => {
            let _ = writeln!(out, "# {key} =");
        }
    }
}
