//! C7: the term-tree builder — walks what remains of the working table
//! after C4–C6 and materializes it into the nested [`TermTree`], then merges
//! that tree over the caller-supplied baseline (spec.md §4.7).

use tracing::{debug, instrument, warn};

use crate::table::{Entry, WorkingTable};
use crate::value::{KeyPath, TermNode, TermTree, TypedValue};
use crate::Error;

/// Builds the final term tree from `table`, inserting entries in ascending
/// key-length order so parent trees exist before their children are set,
/// and logging (but not failing on) any entry that never got coerced by a
/// mapping — spec.md §4.4's "dropped" unmatched raw entries.
#[instrument(level = "debug", skip_all)]
pub(crate) fn build(table: WorkingTable) -> Result<TermTree, Error> {
    let mut entries = table.into_entries();
    entries.sort_by_key(|(key, _)| key.len());

    let mut tree = TermTree::new();
    for (key, entry) in entries {
        let value = match entry {
            Entry::Typed(value) => value,
            Entry::Raw(_) => {
                warn!(key = %key, "dropping setting with no matching mapping");
                continue;
            }
        };
        insert_at(&mut tree, &key, value);
    }

    debug!(top_level_keys = tree.len(), "term tree built");
    Ok(tree)
}

fn insert_at(tree: &mut TermTree, key: &KeyPath, value: TypedValue) {
    let segments = key.segments();
    if segments.is_empty() {
        return;
    }
    let mut cursor = tree;
    for segment in &segments[..segments.len() - 1] {
        cursor = cursor.ensure_tree(&segment.to_string());
    }
    let leaf_key = segments.last().unwrap().to_string();
    let node = match value {
        TypedValue::Term(subtree) => TermNode::Tree(subtree),
        other => TermNode::Leaf(other),
    };
    match node {
        TermNode::Tree(subtree) => {
            let target = cursor.ensure_tree(&leaf_key);
            target.merge(subtree);
        }
        leaf @ TermNode::Leaf(_) => cursor.insert(leaf_key, leaf),
    }
}

/// Merges `overlay` (the freshly-built tree) over `baseline`, per spec.md
/// §4.7/§9: objects merge recursively key-by-key; anything else (lists,
/// scalars, char-lists, pairs) is replaced wholesale by the overlay — "new
/// wins" for the otherwise-unspecified ambiguous cases (documented in
/// DESIGN.md).
pub(crate) fn merge_baseline(mut baseline: TermTree, overlay: TermTree) -> TermTree {
    baseline.merge(overlay);
    baseline
}
